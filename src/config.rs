//! Configuration types for PDF-to-presentation conversion.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Every knob lives in one struct so a run can
//! be logged, cloned onto a blocking thread, or diffed against another run.
//!
//! Credentials are plain injected values. The library never reads them from
//! the environment; the surrounding application (the CLI, a server) decides
//! where keys come from and hands them in here.

use crate::error::Pdf2SlidesError;
use crate::pipeline::llm::GenerativeModel;
use crate::progress::ProgressObserver;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model identifier for presentation generation.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default soft ceiling on the input document size (10 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for a PDF-to-presentation run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2slides::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .render_scale(2.0)
///     .ocr_language("deu")
///     .api_key("my-key")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Render scale applied to each page's natural size. Range: 0.5–4.0. Default: 1.5.
    ///
    /// 1.5× keeps body text legible for Tesseract without making per-page
    /// recognition noticeably slower. Raise it for documents set in small type.
    pub render_scale: f32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps poster-sized pages independently of `render_scale`.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to libpdfium. When `None` the system library is used.
    pub pdfium_library: Option<PathBuf>,

    /// Reject documents larger than this many bytes. Default: 10 MiB. `None` disables the check.
    pub max_document_bytes: Option<usize>,

    /// Which OCR engine recognises page images. Default: [`OcrBackend::Tesseract`].
    pub ocr_backend: OcrBackend,

    /// Tesseract executable. Default: `tesseract` (resolved through `PATH`).
    pub tesseract_binary: PathBuf,

    /// Tesseract language code(s), e.g. `eng` or `eng+fra`. Default: `eng`.
    pub ocr_language: String,

    /// Tesseract page segmentation mode (`--psm`). Range: 0–13. Default: 3.
    pub page_segmentation_mode: u8,

    /// Model identifier for generation. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Credential for the built-in Gemini client.
    pub api_key: Option<String>,

    /// Base URL of the Gemini REST API.
    pub api_base_url: String,

    /// Pre-constructed `edgequake-llm` provider. Used for generation when no
    /// `generative_model` is set, and required by [`OcrBackend::Vision`].
    pub llm_provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generative model. Takes precedence over everything else.
    pub generative_model: Option<Arc<dyn GenerativeModel>>,

    /// Sampling temperature for generation. Default: provider default.
    pub temperature: Option<f32>,

    /// Maximum output tokens for the generation call. Default: 8192.
    ///
    /// A long document turns into many slides; too small a budget truncates
    /// the JSON mid-array and the reply fails to parse.
    pub max_tokens: usize,

    /// Timeout for the generation HTTP call in seconds. Default: none.
    ///
    /// The pipeline imposes no deadline of its own. Callers that need bounded
    /// latency set this or wrap the run in their own timeout.
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives status updates while the pipeline runs.
    pub progress_observer: Option<Arc<dyn ProgressObserver>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            max_rendered_pixels: 4000,
            password: None,
            pdfium_library: None,
            max_document_bytes: Some(DEFAULT_MAX_DOCUMENT_BYTES),
            ocr_backend: OcrBackend::default(),
            tesseract_binary: PathBuf::from("tesseract"),
            ocr_language: "eng".to_string(),
            page_segmentation_mode: 3,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            llm_provider: None,
            generative_model: None,
            temperature: None,
            max_tokens: 8192,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            progress_observer: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("render_scale", &self.render_scale)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("ocr_backend", &self.ocr_backend)
            .field("tesseract_binary", &self.tesseract_binary)
            .field("ocr_language", &self.ocr_language)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("llm_provider", &self.llm_provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "generative_model",
                &self.generative_model.as_ref().map(|_| "<dyn GenerativeModel>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 4.0);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn max_document_bytes(mut self, limit: Option<usize>) -> Self {
        self.config.max_document_bytes = limit;
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn tesseract_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_binary = path.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.page_segmentation_mode = psm;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn llm_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.llm_provider = Some(provider);
        self
    }

    pub fn generative_model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.config.generative_model = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.config.progress_observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Pdf2SlidesError> {
        let c = &self.config;
        if !(0.5..=4.0).contains(&c.render_scale) {
            return Err(Pdf2SlidesError::InvalidConfig(format!(
                "render scale must be 0.5–4.0, got {}",
                c.render_scale
            )));
        }
        if c.page_segmentation_mode > 13 {
            return Err(Pdf2SlidesError::InvalidConfig(format!(
                "page segmentation mode must be 0–13, got {}",
                c.page_segmentation_mode
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(Pdf2SlidesError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(Pdf2SlidesError::InvalidConfig(
                "model identifier must not be empty".into(),
            ));
        }
        if c.ocr_backend == OcrBackend::Vision && c.llm_provider.is_none() {
            return Err(Pdf2SlidesError::InvalidConfig(
                "the vision OCR backend needs an llm_provider".into(),
            ));
        }
        if c.max_document_bytes == Some(0) {
            return Err(Pdf2SlidesError::InvalidConfig(
                "max document size must be > 0 (use None to disable)".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Engine used to recognise text on rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Local Tesseract executable, one process per page. (default)
    #[default]
    Tesseract,
    /// Vision language model reached through the configured `llm_provider`.
    Vision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let c = PipelineConfig::default();
        assert_eq!(c.render_scale, 1.5);
        assert_eq!(c.model, "gemini-2.5-flash");
        assert_eq!(c.ocr_language, "eng");
        assert_eq!(c.max_document_bytes, Some(10 * 1024 * 1024));
        assert_eq!(c.ocr_backend, OcrBackend::Tesseract);
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn builder_clamps_scale() {
        let c = PipelineConfig::builder().render_scale(9.0).build().unwrap();
        assert_eq!(c.render_scale, 4.0);
    }

    #[test]
    fn builder_rejects_bad_psm() {
        let err = PipelineConfig::builder()
            .page_segmentation_mode(14)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("segmentation"));
    }

    #[test]
    fn vision_backend_requires_provider() {
        let err = PipelineConfig::builder()
            .ocr_backend(OcrBackend::Vision)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2SlidesError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = PipelineConfig::builder()
            .api_key("super-secret-key")
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret-key"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
