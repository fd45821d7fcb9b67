//! Post-processing: deterministic cleanup of engine and model output.
//!
//! Two kinds of text pass through here:
//!
//! - **OCR output.** Tesseract emits form feeds between pages, CRLF on some
//!   platforms, runs of blank lines where the page had whitespace, and the
//!   occasional zero-width character. [`clean_ocr_text`] normalises these so
//!   aggregation and the blank-document check see clean input.
//! - **Model replies.** Providers without native schema enforcement often
//!   wrap the JSON in a ```json fence. [`strip_json_fences`] unwraps it.
//!
//! Each rule is a pure `&str → String` function and is tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Normalise recognised page text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF/CR → LF) and drop form feeds
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to one blank line
/// 5. Trim leading/trailing blank lines
pub fn clean_ocr_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim_matches('\n').to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{000C}', "\n")
}

// ── Rule 2: Strip invisible characters ───────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
            )
        })
        .collect()
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Model replies ────────────────────────────────────────────────────────────

static RE_JSON_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*?)\n?```$").unwrap());

/// Trim a model reply and unwrap one outer ```json fence if present.
pub fn strip_json_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_JSON_FENCES.captures(trimmed) {
        caps[1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
