//! # pdf2slides
//!
//! Turn a PDF into a structured slide presentation.
//!
//! ## Why OCR first?
//!
//! Many PDFs worth presenting are scans: there is no text layer to extract.
//! This crate renders every page to an image, recognises the text on it,
//! and hands the whole document text to a language model that must answer
//! with a fixed JSON shape. The reply is validated locally before it
//! becomes a [`Presentation`], so a misbehaving model cannot hand callers a
//! half-formed deck.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Rasterise  every page via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 2. Recognise  page text in order, one OCR engine per run
//!  │                (Tesseract CLI or a vision model)
//!  ├─ 3. Aggregate  join pages; fail fast if no text was found
//!  └─ 4. Generate   one schema-constrained call (Gemini or any
//!                   edgequake-llm provider) + local validation
//! ```
//!
//! Status lines ("Step 2/3: Extracting text... (40%)") are delivered to a
//! [`ProgressObserver`]; see [`progress`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2slides::{convert_file, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The library never reads credentials itself; inject them.
//!     let config = PipelineConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let deck = convert_file("report.pdf", &config).await?;
//!     println!("{}", deck.to_pretty_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2slides` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2slides = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! - **pdfium**: loaded at runtime from the system library path or
//!   [`PipelineConfig::pdfium_library`].
//! - **tesseract**: required for the default OCR backend, plus the language
//!   data for [`PipelineConfig::ocr_language`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrBackend, PipelineConfig, PipelineConfigBuilder};
pub use convert::{
    convert, convert_bytes, convert_file, convert_sync, convert_to_file, failure_reason, Pipeline,
    PipelineState,
};
pub use error::{ErrorKind, GenerationErrorKind, ModelError, OcrError, Pdf2SlidesError};
pub use output::{PageImage, PageStatus, PipelineOutcome, Presentation, RecognizedPage, Slide};
pub use pipeline::input::RawDocument;
pub use progress::{
    ChannelObserver, NoopObserver, PipelineProgress, ProgressEvent, ProgressObserver,
    ProgressStream,
};
