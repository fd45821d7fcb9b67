//! The orchestrator: sequence the stages of one run and translate failures.
//!
//! A run walks a forward-only state machine:
//!
//! ```text
//! Idle → Rasterizing → Recognizing → Aggregating → Generating → Succeeded
//!   └──────────┴────────────┴─────────────┴────────────┴──────→ Failed
//! ```
//!
//! Each stage starts only once the previous one has produced its whole
//! output. Status lines go to the configured [`ProgressObserver`]; when the
//! run ends, [`ProgressObserver::on_cleared`] fires exactly once and nothing
//! else follows.
//!
//! [`Pipeline::run`] never returns an error: any stage failure becomes
//! [`PipelineOutcome::Failure`] with a user-facing reason. Use
//! [`Pipeline::try_run`] or the `convert_*` helpers to get the typed
//! [`Pdf2SlidesError`] instead.

use crate::config::{OcrBackend, PipelineConfig};
use crate::error::Pdf2SlidesError;
use crate::output::{PipelineOutcome, Presentation};
use crate::pipeline::aggregate::{aggregate_pages, ensure_text};
use crate::pipeline::gemini::GeminiModel;
use crate::pipeline::generate::PresentationGenerator;
use crate::pipeline::input::{load_document, RawDocument};
use crate::pipeline::llm::{GenerativeModel, ProviderModel};
use crate::pipeline::ocr::{OcrEngineFactory, TextRecognizer};
use crate::pipeline::render::{PageCallback, PageRasterizer, PdfiumRasterizer};
use crate::pipeline::tesseract::TesseractFactory;
use crate::pipeline::vision::VisionOcrFactory;
use crate::progress::{NoopObserver, PipelineProgress, ProgressObserver, SharedObserver};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Prefix of every user-facing failure reason.
pub const FAILURE_PREFIX: &str = "An error occurred: ";

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Rasterizing,
    Recognizing,
    Aggregating,
    Generating,
    Succeeded,
    Failed,
}

impl PipelineState {
    fn rank(self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::Rasterizing => 1,
            PipelineState::Recognizing => 2,
            PipelineState::Aggregating => 3,
            PipelineState::Generating => 4,
            PipelineState::Succeeded | PipelineState::Failed => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }

    /// Whether `next` is a legal transition from `self`.
    ///
    /// Every non-terminal state may fail. `Succeeded` is reachable only from
    /// `Generating`. Otherwise a state advances to its immediate successor.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            PipelineState::Failed => true,
            PipelineState::Succeeded => self == PipelineState::Generating,
            _ => next.rank() == self.rank() + 1,
        }
    }
}

/// Tracks the state of one run and reports transitions.
struct RunTracker<'a> {
    state: PipelineState,
    observer: &'a dyn ProgressObserver,
}

impl<'a> RunTracker<'a> {
    fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            state: PipelineState::Idle,
            observer,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} → {:?}",
            self.state,
            next
        );
        debug!("Pipeline state: {:?} → {:?}", self.state, next);
        self.observer.on_state_change(self.state, next);
        self.state = next;
    }

    fn report(&self, progress: PipelineProgress) {
        self.observer.on_progress(&progress);
    }
}

/// What a run starts from.
enum Source<'a> {
    Document(RawDocument),
    Input {
        input: &'a str,
        download_timeout_secs: u64,
    },
}

/// A configured pipeline. Reusable: each call to [`Pipeline::run`] is an
/// independent run with fresh per-run state.
#[derive(Clone)]
pub struct Pipeline {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: TextRecognizer,
    generator: PresentationGenerator,
    observer: SharedObserver,
    max_document_bytes: Option<usize>,
}

impl Pipeline {
    /// Build the production pipeline described by `config`.
    pub fn new(config: &PipelineConfig) -> Result<Self, Pdf2SlidesError> {
        let model = resolve_model(config)?;
        let factory = resolve_ocr_factory(config)?;
        Ok(Self {
            rasterizer: Arc::new(PdfiumRasterizer::new(config)),
            recognizer: TextRecognizer::new(factory),
            generator: PresentationGenerator::from_config(model, config),
            observer: config
                .progress_observer
                .clone()
                .unwrap_or_else(|| Arc::new(NoopObserver)),
            max_document_bytes: config.max_document_bytes,
        })
    }

    /// Assemble a pipeline from explicit stages. No observer and no size
    /// ceiling until set.
    pub fn with_components(
        rasterizer: Arc<dyn PageRasterizer>,
        recognizer: TextRecognizer,
        generator: PresentationGenerator,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            generator,
            observer: Arc::new(NoopObserver),
            max_document_bytes: None,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_max_document_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_document_bytes = limit;
        self
    }

    /// Run the pipeline, folding any failure into [`PipelineOutcome::Failure`].
    pub async fn run(&self, document: RawDocument) -> PipelineOutcome {
        match self.try_run(document).await {
            Ok(presentation) => PipelineOutcome::Success(presentation),
            Err(e) => PipelineOutcome::Failure {
                reason: failure_reason(&e),
            },
        }
    }

    /// Run the pipeline and return the typed error on failure.
    pub async fn try_run(&self, document: RawDocument) -> Result<Presentation, Pdf2SlidesError> {
        self.observe(Source::Document(document)).await
    }

    /// Load `input` (a path or an HTTP(S) URL) and run the pipeline on it.
    ///
    /// Loading happens inside the run, so a missing file or an oversized
    /// download is reported to the observer like any other stage failure.
    pub async fn try_run_input(
        &self,
        input: &str,
        download_timeout_secs: u64,
    ) -> Result<Presentation, Pdf2SlidesError> {
        self.observe(Source::Input {
            input,
            download_timeout_secs,
        })
        .await
    }

    async fn observe(&self, source: Source<'_>) -> Result<Presentation, Pdf2SlidesError> {
        let start = Instant::now();
        let mut run = RunTracker::new(self.observer.as_ref());

        let result = self.execute(source, &mut run).await;
        match &result {
            Ok(p) => {
                run.advance(PipelineState::Succeeded);
                info!(
                    "Run succeeded: '{}' ({} slides) in {:?}",
                    p.title,
                    p.slides.len(),
                    start.elapsed()
                );
            }
            Err(e) => {
                let failed_in = run.state;
                run.advance(PipelineState::Failed);
                error!(
                    "Run failed during {:?} ({:?}): {}",
                    failed_in,
                    e.kind(),
                    e
                );
            }
        }

        self.observer.on_cleared();
        result
    }

    async fn execute(
        &self,
        source: Source<'_>,
        run: &mut RunTracker<'_>,
    ) -> Result<Presentation, Pdf2SlidesError> {
        // ── Stage 1: rasterise ───────────────────────────────────────────
        run.advance(PipelineState::Rasterizing);
        run.report(PipelineProgress::reading_pdf());
        let document = match source {
            Source::Document(document) => document,
            Source::Input {
                input,
                download_timeout_secs,
            } => load_document(input, self.max_document_bytes, download_timeout_secs).await?,
        };
        document.validate(self.max_document_bytes)?;
        info!(
            "Rasterising {} ({} bytes)",
            document.name().unwrap_or("document"),
            document.len()
        );

        let stage_start = Instant::now();
        let observer = Arc::clone(&self.observer);
        let on_page: PageCallback = Arc::new(move |page, total| {
            observer.on_progress(&PipelineProgress::reading_page(page, total));
        });
        let images = self.rasterizer.rasterize(document, on_page).await?;
        info!("Rendered {} pages in {:?}", images.len(), stage_start.elapsed());

        // ── Stage 2: recognise ───────────────────────────────────────────
        run.advance(PipelineState::Recognizing);
        run.report(PipelineProgress::extracting_text());
        let stage_start = Instant::now();
        let observer = &self.observer;
        let pages = self
            .recognizer
            .recognize(&images, &|percent| {
                observer.on_progress(&PipelineProgress::extracting_percent(percent));
            })
            .await?;
        drop(images);
        info!("OCR finished in {:?}", stage_start.elapsed());

        // ── Aggregate ────────────────────────────────────────────────────
        run.advance(PipelineState::Aggregating);
        run.report(PipelineProgress::combining_text());
        let text = aggregate_pages(&pages);
        ensure_text(&text)?;
        debug!("Aggregated {} chars from {} pages", text.len(), pages.len());

        // ── Stage 3: generate ────────────────────────────────────────────
        run.advance(PipelineState::Generating);
        run.report(PipelineProgress::generating());
        self.generator.generate(&text).await
    }
}

/// The user-facing reason for a failed run.
pub fn failure_reason(error: &Pdf2SlidesError) -> String {
    format!("{}{}", FAILURE_PREFIX, error)
}

/// Pick the generative model: an injected model, then an injected
/// `edgequake-llm` provider, then the Gemini client if an API key is set.
pub fn resolve_model(config: &PipelineConfig) -> Result<Arc<dyn GenerativeModel>, Pdf2SlidesError> {
    if let Some(ref model) = config.generative_model {
        return Ok(Arc::clone(model));
    }
    if let Some(ref provider) = config.llm_provider {
        return Ok(Arc::new(ProviderModel::new(Arc::clone(provider))));
    }
    if config.api_key.is_some() {
        return Ok(Arc::new(GeminiModel::new(config)?));
    }
    Err(Pdf2SlidesError::ProviderNotConfigured {
        hint: "Set an API key (--api-key or GEMINI_API_KEY), or choose a provider with --provider."
            .into(),
    })
}

/// Build the OCR engine factory for the configured backend.
pub fn resolve_ocr_factory(
    config: &PipelineConfig,
) -> Result<Arc<dyn OcrEngineFactory>, Pdf2SlidesError> {
    match config.ocr_backend {
        OcrBackend::Tesseract => Ok(Arc::new(TesseractFactory::new(
            config.tesseract_binary.clone(),
            config.ocr_language.clone(),
            config.page_segmentation_mode,
        ))),
        OcrBackend::Vision => {
            let provider = config.llm_provider.clone().ok_or_else(|| {
                Pdf2SlidesError::InvalidConfig("the vision OCR backend needs an llm_provider".into())
            })?;
            Ok(Arc::new(VisionOcrFactory::new(provider, config.max_tokens)))
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Convert a PDF file or URL into a presentation.
///
/// # Example
/// ```rust,no_run
/// use pdf2slides::{convert_file, PipelineConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::builder().api_key("your-gemini-key").build()?;
/// let presentation = convert_file("report.pdf", &config).await?;
/// println!("{}", presentation.to_outline());
/// # Ok(())
/// # }
/// ```
pub async fn convert_file(
    input: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<Presentation, Pdf2SlidesError> {
    let input = input.as_ref();
    info!("Starting conversion: {}", input);
    let pipeline = Pipeline::new(config).inspect_err(|_| {
        if let Some(observer) = &config.progress_observer {
            observer.on_cleared();
        }
    })?;
    pipeline
        .try_run_input(input, config.download_timeout_secs)
        .await
}

/// Convert in-memory PDF bytes into a presentation.
pub async fn convert_bytes(
    bytes: impl Into<Vec<u8>>,
    config: &PipelineConfig,
) -> Result<Presentation, Pdf2SlidesError> {
    let pipeline = Pipeline::new(config).inspect_err(|_| {
        if let Some(observer) = &config.progress_observer {
            observer.on_cleared();
        }
    })?;
    pipeline.try_run(RawDocument::from_bytes(bytes)).await
}

/// Like [`convert_file`], reporting failure as a [`PipelineOutcome`].
pub async fn convert(input: impl AsRef<str>, config: &PipelineConfig) -> PipelineOutcome {
    match convert_file(input, config).await {
        Ok(presentation) => PipelineOutcome::Success(presentation),
        Err(e) => PipelineOutcome::Failure {
            reason: failure_reason(&e),
        },
    }
}

/// Convert and write the presentation as pretty JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<Presentation, Pdf2SlidesError> {
    let presentation = convert_file(input, config).await?;
    write_presentation(&presentation, output_path.as_ref()).await?;
    Ok(presentation)
}

/// Write `presentation` as pretty JSON, atomically.
pub async fn write_presentation(
    presentation: &Presentation,
    path: &Path,
) -> Result<(), Pdf2SlidesError> {
    let json = presentation
        .to_pretty_json()
        .map_err(|e| Pdf2SlidesError::Internal(format!("JSON serialisation failed: {}", e)))?;
    let write_failed = |e: std::io::Error| Pdf2SlidesError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;

    info!("Wrote {}", path.display());
    Ok(())
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<Presentation, Pdf2SlidesError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2SlidesError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(input, config))
}
