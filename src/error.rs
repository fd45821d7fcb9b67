//! Error types for the pdf2slides library.
//!
//! Two tiers of failure exist, mirroring the two ways a run can go wrong:
//!
//! * [`Pdf2SlidesError`]: **Fatal**: the run cannot produce a presentation
//!   (corrupt PDF, nothing readable, model reply unusable). Every variant is
//!   terminal for the current run; nothing is retried.
//!
//! * [`OcrError`]: raised by an OCR engine for one page. A
//!   [`OcrError::PageFailed`] is tolerated: the page is recorded with
//!   [`crate::output::PageStatus::Failed`] and contributes no text. An
//!   [`OcrError::EngineFailed`] means the engine itself is gone and aborts the
//!   run as [`Pdf2SlidesError::OcrEngineFailed`].
//!
//! Remote-call failures surface as [`ModelError`] and are always folded into
//! [`Pdf2SlidesError::Generation`], whose `Display` is deliberately generic:
//! the diagnostic detail is kept in the value and logged, never shown.

use std::path::PathBuf;
use thiserror::Error;

/// User-facing text for every generation failure.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate presentation. \
The AI model might be overloaded or the content could not be processed.";

/// All fatal errors returned by the pdf2slides library.
#[derive(Debug, Error)]
pub enum Pdf2SlidesError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The document exceeds the configured size ceiling.
    #[error("PDF is too large: {size} bytes (limit is {limit} bytes)")]
    DocumentTooLarge { size: usize, limit: usize },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// The buffer does not start with the `%PDF` signature.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF could not be parsed: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// pdfium failed to render one page; the whole rasterisation is aborted.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine could not be started.
    #[error("OCR engine '{engine}' is unavailable: {detail}")]
    OcrEngineUnavailable { engine: String, detail: String },

    /// The OCR engine died part-way through the document.
    #[error("OCR engine failed on page {page}: {detail}")]
    OcrEngineFailed { page: usize, detail: String },

    /// Recognition finished but the aggregated text is empty or whitespace.
    #[error(
        "OCR could not extract any text from the PDF. \
The document might be image-only with unreadable text."
    )]
    NoTextExtracted,

    // ── Generation errors ─────────────────────────────────────────────────
    /// The remote call failed or its reply could not be turned into a
    /// presentation. `detail` is diagnostic only and is not displayed.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    Generation {
        kind: GenerationErrorKind,
        detail: String,
    },

    /// No generative model could be built from the configuration.
    #[error("Generative model is not configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2SlidesError {
    /// Shorthand for a generation failure of the given kind.
    pub fn generation(kind: GenerationErrorKind, detail: impl Into<String>) -> Self {
        Self::Generation {
            kind,
            detail: detail.into(),
        }
    }

    /// Coarse classification used for logging and by callers that branch on
    /// the failing stage rather than the exact variant.
    pub fn kind(&self) -> ErrorKind {
        use Pdf2SlidesError::*;
        match self {
            FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidInput { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. }
            | DocumentTooLarge { .. } => ErrorKind::Input,
            NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordRequired
            | WrongPassword
            | RasterisationFailed { .. }
            | PdfiumBindingFailed(_) => ErrorKind::Rasterization,
            OcrEngineUnavailable { .. } | OcrEngineFailed { .. } => ErrorKind::Ocr,
            NoTextExtracted => ErrorKind::NoTextExtracted,
            Generation { .. } => ErrorKind::Generation,
            ProviderNotConfigured { .. } | InvalidConfig(_) => ErrorKind::Config,
            OutputWriteFailed { .. } => ErrorKind::Output,
            Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Which part of the pipeline an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Rasterization,
    Ocr,
    NoTextExtracted,
    Generation,
    Config,
    Output,
    Internal,
}

/// Why a generation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// The remote call itself failed (network, HTTP status, provider error).
    Transport,
    /// The reply body was not parseable JSON.
    MalformedResponse,
    /// The reply parsed but does not have the presentation shape.
    SchemaViolation,
}

/// A failure reported by an OCR engine for a single page.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// This page could not be read; the run continues without its text.
    #[error("page {page}: recognition failed: {detail}")]
    PageFailed { page: usize, detail: String },

    /// The engine can no longer be used; the run is aborted.
    #[error("page {page}: OCR engine failed: {detail}")]
    EngineFailed { page: usize, detail: String },
}

/// A failure of the remote generative-model call.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered but returned no candidate text.
    #[error("response contained no text: {0}")]
    EmptyResponse(String),

    /// An `edgequake-llm` provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        ModelError::Transport(e.to_string())
    }
}
