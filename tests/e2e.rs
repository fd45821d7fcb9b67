//! End-to-end integration tests for pdf2slides.
//!
//! These tests use real PDF files in `./test_cases/`, the system pdfium and
//! Tesseract, and make live Gemini calls. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! Expected files:
//!   test_cases/lecture_notes.pdf   a few pages of machine-printed text
//!   test_cases/scanned_letter.pdf  a one-page scan
//!   test_cases/blank.pdf           pages with no text at all

use pdf2slides::{
    convert, convert_file, convert_to_file, PipelineConfig, PipelineOutcome, Pdf2SlidesError,
    Presentation,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn live_config() -> Option<PipelineConfig> {
    let key = std::env::var("GEMINI_API_KEY").ok()?;
    let mut builder = PipelineConfig::builder().api_key(key);
    if let Ok(lib) = std::env::var("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_library(lib);
    }
    Some(builder.build().expect("valid config"))
}

/// Assert the presentation passes basic quality checks.
fn assert_presentation_quality(deck: &Presentation, context: &str) {
    assert!(!deck.title.trim().is_empty(), "[{context}] Title is empty");
    assert!(!deck.slides.is_empty(), "[{context}] No slides generated");

    for (i, slide) in deck.slides.iter().enumerate() {
        assert!(
            !slide.title.trim().is_empty(),
            "[{context}] Slide {} has an empty title",
            i + 1
        );
    }

    let bullets: usize = deck.slides.iter().map(|s| s.content.len()).sum();
    assert!(bullets > 0, "[{context}] No bullet points in any slide");

    println!(
        "[{context}] ✓  '{}', {} slides, {} bullets",
        deck.title,
        deck.slides.len(),
        bullets
    );
}

// ── Conversion tests (live) ──────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_lecture_notes() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("lecture_notes.pdf"));
    let Some(config) = live_config() else {
        println!("SKIP: GEMINI_API_KEY not set");
        return;
    };

    let deck = convert_file(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    assert_presentation_quality(&deck, "lecture_notes");
}

#[tokio::test]
async fn test_convert_scanned_letter_to_file() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scanned_letter.pdf"));
    let Some(config) = live_config() else {
        println!("SKIP: GEMINI_API_KEY not set");
        return;
    };
    let out = output_dir().join("scanned_letter.json");

    let deck = convert_to_file(path.to_str().unwrap(), &out, &config)
        .await
        .expect("conversion should succeed");

    assert_presentation_quality(&deck, "scanned_letter");
    let written = std::fs::read_to_string(&out).expect("output file exists");
    let back: Presentation = serde_json::from_str(&written).expect("output is valid JSON");
    assert_eq!(back, deck);
}

#[tokio::test]
async fn test_blank_document_reports_no_text() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("blank.pdf"));
    // The model must never be reached, so any key will do.
    let config = PipelineConfig::builder()
        .api_key("unused")
        .build()
        .expect("valid config");

    let err = convert_file(path.to_str().unwrap(), &config)
        .await
        .expect_err("blank document must fail");
    assert!(
        matches!(err, Pdf2SlidesError::NoTextExtracted),
        "unexpected error: {err}"
    );
}

// ── Failure paths (local tools only) ─────────────────────────────────────────

#[tokio::test]
async fn test_nonexistent_file() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let config = PipelineConfig::builder()
        .api_key("unused")
        .build()
        .expect("valid config");

    match convert("test_cases/does_not_exist.pdf", &config).await {
        PipelineOutcome::Failure { reason } => {
            assert!(reason.starts_with("An error occurred: "), "got: {reason}");
            assert!(reason.contains("not found"), "got: {reason}");
        }
        PipelineOutcome::Success(_) => panic!("missing file must fail"),
    }
}

#[tokio::test]
async fn test_not_a_pdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, b"just some text, not a PDF").unwrap();
    let config = PipelineConfig::builder()
        .api_key("unused")
        .build()
        .expect("valid config");

    let err = convert_file(path.to_str().unwrap(), &config)
        .await
        .expect_err("non-PDF must fail");
    assert!(matches!(err, Pdf2SlidesError::NotAPdf { .. }), "got: {err}");
}
