//! Progress reporting for pipeline runs.
//!
//! Inject an [`Arc<dyn ProgressObserver>`] via
//! [`crate::config::PipelineConfigBuilder::progress_observer`] to receive a
//! human-readable status line as the run moves through its stages.
//!
//! Updates are transient: each [`PipelineProgress`] supersedes the previous
//! one, and [`ProgressObserver::on_cleared`] fires exactly once when the run
//! ends, successfully or not. During OCR an update arrives for every
//! percentage-point change, so observers should be cheap.
//!
//! Callers that prefer a stream to a callback can use [`channel`], which
//! returns a [`ChannelObserver`] and the [`ProgressStream`] it feeds.
//!
//! # Example
//!
//! ```rust
//! use pdf2slides::{PipelineConfig, PipelineProgress, ProgressObserver};
//! use std::sync::Arc;
//!
//! struct StatusLine;
//!
//! impl ProgressObserver for StatusLine {
//!     fn on_progress(&self, progress: &PipelineProgress) {
//!         eprintln!("{}", progress.message);
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_observer(Arc::new(StatusLine) as Arc<dyn ProgressObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::convert::PipelineState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Number of user-visible stages.
pub const STAGE_COUNT: u8 = 3;

/// A status update: which stage (1–3) the run is in and what to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineProgress {
    pub stage: u8,
    pub message: String,
}

impl PipelineProgress {
    /// "Step 1/3: Reading PDF and preparing pages..."
    pub fn reading_pdf() -> Self {
        Self::new(1, "Reading PDF and preparing pages...")
    }

    /// "Step 1/3: Reading PDF... (Page i/N)"
    pub fn reading_page(page: usize, total: usize) -> Self {
        Self::new(1, format!("Reading PDF... (Page {page}/{total})"))
    }

    /// "Step 2/3: Extracting text with OCR... (This may take a while)"
    pub fn extracting_text() -> Self {
        Self::new(2, "Extracting text with OCR... (This may take a while)")
    }

    /// "Step 2/3: Extracting text... (p%)"
    pub fn extracting_percent(percent: u8) -> Self {
        Self::new(2, format!("Extracting text... ({percent}%)"))
    }

    /// "Step 2/3: Combining page text..."
    pub fn combining_text() -> Self {
        Self::new(2, "Combining page text...")
    }

    /// "Step 3/3: Generating presentation with AI..."
    pub fn generating() -> Self {
        Self::new(3, "Generating presentation with AI...")
    }

    fn new(stage: u8, text: impl AsRef<str>) -> Self {
        Self {
            stage,
            message: format!("Step {stage}/{STAGE_COUNT}: {}", text.as_ref()),
        }
    }
}

/// Receives status updates from a pipeline run.
///
/// All methods default to no-ops so implementations override only what they
/// need. Implementations must be `Send + Sync`: rasterisation reports pages
/// from a blocking worker thread.
pub trait ProgressObserver: Send + Sync {
    /// A new status line; replaces whatever was shown before.
    fn on_progress(&self, progress: &PipelineProgress) {
        let _ = progress;
    }

    /// The run moved from one state to the next.
    fn on_state_change(&self, from: PipelineState, to: PipelineState) {
        let _ = (from, to);
    }

    /// The run ended. Clear any status line. No further events follow.
    fn on_cleared(&self) {}
}

/// An observer that ignores everything. Used when none is configured.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type SharedObserver = Arc<dyn ProgressObserver>;

/// An event forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress(PipelineProgress),
    StateChanged { from: PipelineState, to: PipelineState },
    Cleared,
}

/// Stream half of [`channel`].
pub type ProgressStream = UnboundedReceiverStream<ProgressEvent>;

/// Observer that forwards every event into an unbounded channel.
///
/// Sends never block; if the receiving side has been dropped events are
/// silently discarded.
#[derive(Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, progress: &PipelineProgress) {
        let _ = self.tx.send(ProgressEvent::Progress(progress.clone()));
    }

    fn on_state_change(&self, from: PipelineState, to: PipelineState) {
        let _ = self.tx.send(ProgressEvent::StateChanged { from, to });
    }

    fn on_cleared(&self) {
        let _ = self.tx.send(ProgressEvent::Cleared);
    }
}

/// Create a channel-backed observer and the stream of its events.
pub fn channel() -> (ChannelObserver, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelObserver { tx }, UnboundedReceiverStream::new(rx))
}
