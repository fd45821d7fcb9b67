//! Text aggregation: per-page text → one document string.
//!
//! Pages are joined in the order given with a blank line between them.
//! Failed and empty pages contribute nothing, so they leave no stray
//! separators behind.

use crate::error::Pdf2SlidesError;
use crate::output::RecognizedPage;

/// Separator placed between consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Join page texts in order, skipping blank entries.
pub fn aggregate<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// [`aggregate`] over recognised pages.
pub fn aggregate_pages(pages: &[RecognizedPage]) -> String {
    let texts: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();
    aggregate(&texts)
}

/// Fail with [`Pdf2SlidesError::NoTextExtracted`] if nothing readable remains.
pub fn ensure_text(text: &str) -> Result<(), Pdf2SlidesError> {
    if text.trim().is_empty() {
        Err(Pdf2SlidesError::NoTextExtracted)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_in_order_with_blank_line() {
        let out = aggregate(&["Page one.", "Page two.", "Page three."]);
        assert_eq!(out, "Page one.\n\nPage two.\n\nPage three.");
    }

    #[test]
    fn blank_pages_leave_no_gap() {
        let out = aggregate(&["first", "", "  \n", "last"]);
        assert_eq!(out, "first\n\nlast");
    }

    #[test]
    fn is_idempotent() {
        let pages = vec!["alpha".to_string(), String::new(), "gamma".to_string()];
        assert_eq!(aggregate(&pages), aggregate(&pages));
    }

    #[test]
    fn aggregates_recognised_pages() {
        let pages = vec![
            RecognizedPage::from_text(1, "one".into()),
            RecognizedPage::failed(2, "crashed"),
            RecognizedPage::from_text(3, "three".into()),
        ];
        assert_eq!(aggregate_pages(&pages), "one\n\nthree");
    }

    #[test]
    fn empty_and_whitespace_are_rejected() {
        assert!(matches!(ensure_text(""), Err(Pdf2SlidesError::NoTextExtracted)));
        assert!(matches!(
            ensure_text(&aggregate(&[" ", "\n\t"])),
            Err(Pdf2SlidesError::NoTextExtracted)
        ));
        assert!(ensure_text("x").is_ok());
    }
}
