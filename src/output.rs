//! Domain model produced by the pipeline.
//!
//! [`Presentation`] is the value handed to the surrounding application; its
//! pretty-printed JSON form is the canonical export format. The per-page
//! types ([`PageImage`], [`RecognizedPage`]) only live for the duration of a
//! single run.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One slide: a heading and its bullet points in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub content: Vec<String>,
}

/// A titled, ordered sequence of slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Pretty-printed JSON, the format used for copy/export.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text outline: the title, then each numbered slide with its bullets.
    pub fn to_outline(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&format!("{} slides\n", self.slides.len()));
        for (i, slide) in self.slides.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("{}. {}\n", i + 1, slide.title));
            for point in &slide.content {
                out.push_str(&format!("   - {}\n", point));
            }
        }
        out
    }
}

/// The single terminal value of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The run produced a fully validated presentation.
    Success(Presentation),
    /// The run failed; `reason` is ready to show to a user.
    Failure { reason: String },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        match self {
            PipelineOutcome::Success(p) => Some(p),
            PipelineOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Success(_) => None,
            PipelineOutcome::Failure { reason } => Some(reason),
        }
    }
}

/// A rendered page, identified by its 1-based page number.
#[derive(Clone)]
pub struct PageImage {
    pub page: usize,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(page: usize, image: DynamicImage) -> Self {
        Self { page, image }
    }
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("page", &self.page)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

/// How recognition went for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    /// The engine returned non-blank text.
    Recognized,
    /// The engine ran fine but found nothing readable.
    Empty,
    /// The engine could not read this page; the run continued without it.
    Failed { detail: String },
}

/// Text recovered from one [`PageImage`], keyed by the same page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedPage {
    pub page: usize,
    pub text: String,
    pub status: PageStatus,
}

impl RecognizedPage {
    /// Build a page result from engine output, deriving the status from the text.
    pub fn from_text(page: usize, text: String) -> Self {
        let status = if text.trim().is_empty() {
            PageStatus::Empty
        } else {
            PageStatus::Recognized
        };
        Self { page, text, status }
    }

    /// A page the engine failed on. It contributes an empty string.
    pub fn failed(page: usize, detail: impl Into<String>) -> Self {
        Self {
            page,
            text: String::new(),
            status: PageStatus::Failed {
                detail: detail.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PageStatus::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Presentation {
        Presentation {
            title: "Quarterly Review".into(),
            slides: vec![
                Slide {
                    title: "Revenue".into(),
                    content: vec!["Up 12%".into(), "Up 12%".into()],
                },
                Slide {
                    title: "Hiring".into(),
                    content: vec![],
                },
            ],
        }
    }

    #[test]
    fn json_round_trip_preserves_everything() {
        let p = sample();
        let json = p.to_pretty_json().unwrap();
        let back: Presentation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn pretty_json_uses_schema_field_names() {
        let json = sample().to_pretty_json().unwrap();
        assert!(json.contains("\"title\": \"Quarterly Review\""));
        assert!(json.contains("\"slides\": ["));
        assert!(json.contains("\"content\": ["));
        assert!(json.contains('\n'), "expected pretty-printed output");
    }

    #[test]
    fn outline_numbers_slides() {
        let outline = sample().to_outline();
        assert!(outline.starts_with("Quarterly Review\n2 slides\n"));
        assert!(outline.contains("1. Revenue\n   - Up 12%\n   - Up 12%\n"));
        assert!(outline.contains("2. Hiring\n"));
    }

    #[test]
    fn recognized_page_status_from_text() {
        assert_eq!(
            RecognizedPage::from_text(1, "Hello".into()).status,
            PageStatus::Recognized
        );
        assert_eq!(
            RecognizedPage::from_text(2, " \n\t".into()).status,
            PageStatus::Empty
        );
        let failed = RecognizedPage::failed(3, "tesseract exited with 1");
        assert!(failed.is_failed());
        assert!(failed.text.is_empty());
    }

    #[test]
    fn outcome_accessors() {
        let ok = PipelineOutcome::Success(sample());
        assert!(ok.is_success());
        assert_eq!(ok.presentation().map(|p| p.slides.len()), Some(2));

        let err = PipelineOutcome::Failure {
            reason: "An error occurred: boom".into(),
        };
        assert!(!err.is_success());
        assert_eq!(err.failure_reason(), Some("An error occurred: boom"));
    }
}
