//! CLI binary for pdf2slides.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, shows the status line while the run progresses, and
//! prints the resulting presentation.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_llm::ProviderFactory;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2slides::convert::write_presentation;
use pdf2slides::progress;
use pdf2slides::{
    convert_file, failure_reason, OcrBackend, PipelineConfig, PipelineState, Presentation,
    ProgressEvent, ProgressObserver, ProgressStream,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress display using indicatif ─────────────────────────────────────

/// Label printed when a stage finishes.
fn stage_label(state: PipelineState) -> Option<&'static str> {
    match state {
        PipelineState::Rasterizing => Some("Rendered pages"),
        PipelineState::Recognizing => Some("Extracted text"),
        PipelineState::Aggregating => Some("Assembled document text"),
        PipelineState::Generating => Some("Generated presentation"),
        _ => None,
    }
}

/// Drive a spinner from the pipeline's event stream: the message is the
/// current status line, and each finished stage gets a log line.
///
/// Returns when the run clears its status or every sender is dropped.
async fn render_progress(mut events: ProgressStream) {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_message("Starting…");
    bar.enable_steady_tick(Duration::from_millis(80));

    let mut stage_started = Instant::now();
    while let Some(event) = events.next().await {
        match event {
            ProgressEvent::Progress(p) => bar.set_message(p.message),
            ProgressEvent::StateChanged { from, to } => {
                if to != PipelineState::Failed {
                    if let Some(label) = stage_label(from) {
                        bar.println(format!(
                            "  {} {:<24} {}",
                            green("✓"),
                            label,
                            dim(&format!("{:.1}s", stage_started.elapsed().as_secs_f64()))
                        ));
                    }
                }
                stage_started = Instant::now();
            }
            ProgressEvent::Cleared => break,
        }
    }
    bar.finish_and_clear();
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a presentation (JSON on stdout)
  pdf2slides report.pdf

  # Write the presentation to a file
  pdf2slides report.pdf -o report.json

  # Plain-text outline instead of JSON
  pdf2slides --format outline scan.pdf

  # German scan, single-column layout
  pdf2slides --lang deu --psm 4 brief.pdf

  # Convert from URL
  pdf2slides https://example.com/whitepaper.pdf -o whitepaper.json

  # Use another provider for generation (reads that provider's API key)
  pdf2slides --provider openai --model gpt-4.1-mini report.pdf

  # OCR with a vision model instead of Tesseract
  pdf2slides --provider openai --model gpt-4.1-mini --ocr vision scan.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default generation backend)
  PDF2SLIDES_MODEL        Model ID (default: gemini-2.5-flash)
  PDF2SLIDES_PROVIDER     edgequake-llm provider (openai, anthropic, gemini, ollama, …)
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise the system library is used
  RUST_LOG                Override log filter (e.g. pdf2slides=debug)

REQUIREMENTS:
  libpdfium               Loaded at runtime for rendering pages
  tesseract               Needed for the default OCR backend, with language data
"#;

/// Turn PDF files and URLs into slide presentations.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2slides",
    version,
    about = "Turn PDF files and URLs into structured slide presentations",
    long_about = "Render every page of a PDF, recognise its text with OCR, and ask a language \
model to organise the whole text into a titled deck of slides with bullet points. The model's \
reply is validated before it is printed as JSON or as a plain-text outline.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the presentation to this file instead of stdout.
    #[arg(short, long, env = "PDF2SLIDES_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: FormatArg,

    /// Model ID used for generation.
    #[arg(long, env = "PDF2SLIDES_MODEL", default_value = pdf2slides::config::DEFAULT_MODEL)]
    model: String,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generate through an edgequake-llm provider instead of the Gemini API.
    #[arg(long, env = "PDF2SLIDES_PROVIDER")]
    provider: Option<String>,

    /// OCR backend.
    #[arg(long, value_enum, default_value = "tesseract")]
    ocr: OcrArg,

    /// Tesseract language(s), e.g. eng or eng+deu.
    #[arg(long, env = "PDF2SLIDES_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: u8,

    /// Tesseract executable.
    #[arg(long, env = "TESSERACT_PATH", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Page render scale (0.5–4.0).
    #[arg(long, default_value_t = 1.5)]
    scale: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2SLIDES_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Reject documents larger than this many MiB (0 disables the check).
    #[arg(long, default_value_t = 10)]
    max_size_mb: usize,

    /// Sampling temperature for generation (0.0–2.0).
    #[arg(long)]
    temperature: Option<f32>,

    /// Max output tokens for generation.
    #[arg(long, default_value_t = 8192)]
    max_tokens: usize,

    /// Timeout for the generation call in seconds (none by default).
    #[arg(long)]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2SLIDES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2SLIDES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2SLIDES_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Json,
    Outline,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OcrArg {
    Tesseract,
    Vision,
}

impl From<OcrArg> for OcrBackend {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Tesseract => OcrBackend::Tesseract,
            OcrArg::Vision => OcrBackend::Vision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // status line carries the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let (observer, ui) = if show_progress {
        let (observer, events) = progress::channel();
        (
            Some(Arc::new(observer) as Arc<dyn ProgressObserver>),
            Some(tokio::spawn(render_progress(events))),
        )
    } else {
        (None, None)
    };

    let config = build_config(&cli, observer)?;
    let started = Instant::now();

    let result = convert_file(&cli.input, &config).await;
    // Dropping the last sender ends the event stream even when the run
    // failed before the pipeline started.
    drop(config);
    if let Some(ui) = ui {
        ui.await.ok();
    }

    let deck = match result {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("{} {}", red("✘"), failure_reason(&e));
            std::process::exit(1);
        }
    };

    write_output(&cli, &deck).await?;

    if !cli.quiet {
        eprintln!(
            "{} {}  {} slides  {}",
            green("✔"),
            bold(&deck.title),
            deck.slides.len(),
            dim(&format!("{:.1}s", started.elapsed().as_secs_f64())),
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(
    cli: &Cli,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> Result<PipelineConfig> {
    let max_bytes = (cli.max_size_mb > 0).then(|| cli.max_size_mb * 1024 * 1024);

    let mut builder = PipelineConfig::builder()
        .render_scale(cli.scale)
        .max_document_bytes(max_bytes)
        .ocr_backend(cli.ocr.into())
        .tesseract_binary(cli.tesseract.clone())
        .ocr_language(cli.lang.clone())
        .page_segmentation_mode(cli.psm)
        .model(cli.model.clone())
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref name) = cli.provider {
        let provider = ProviderFactory::create_llm_provider(name, &cli.model)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Failed to create provider '{name}'"))?;
        builder = builder.llm_provider(provider);
    } else if matches!(cli.ocr, OcrArg::Vision) {
        anyhow::bail!("--ocr vision needs --provider to choose the vision model's provider");
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(observer) = observer {
        builder = builder.progress_observer(observer);
    }

    builder.build().context("Invalid configuration")
}

/// Print or save the presentation in the chosen format.
async fn write_output(cli: &Cli, deck: &Presentation) -> Result<()> {
    match (&cli.output, cli.format) {
        (Some(path), FormatArg::Json) => write_presentation(deck, path)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        (Some(path), FormatArg::Outline) => tokio::fs::write(path, deck.to_outline())
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        (None, format) => {
            let text = match format {
                FormatArg::Json => deck.to_pretty_json().context("Failed to serialise output")?,
                FormatArg::Outline => deck.to_outline(),
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
            Ok(())
        }
    }
}
