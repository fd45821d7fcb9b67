//! Text recognition: run one OCR engine over every page image, in order.
//!
//! An engine is expensive to start (Tesseract language data, a VLM client),
//! so one instance is created per run and reused for every page. It is held
//! by an [`EngineGuard`] whose `Drop` calls [`OcrEngine::terminate`], so the
//! engine is released on every exit path: normal completion, an early `?`
//! return, or a panic unwinding through the recogniser.
//!
//! Pages are recognised strictly one after another. Output position `i`
//! always corresponds to input position `i`; aggregation relies on it.
//!
//! A page the engine cannot read ([`OcrError::PageFailed`]) does not abort
//! the run. It is recorded as [`PageStatus::Failed`] with empty text. Only
//! [`OcrError::EngineFailed`] stops recognition.
//!
//! [`PageStatus::Failed`]: crate::output::PageStatus::Failed

use crate::error::{OcrError, Pdf2SlidesError};
use crate::output::{PageImage, RecognizedPage};
use crate::pipeline::postprocess::clean_ocr_text;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reports how far the engine is through the current page, `0.0..=1.0`.
pub type PageProgress<'a> = &'a mut (dyn FnMut(f32) + Send);

/// A live OCR engine instance, exclusively owned by one run.
#[async_trait]
pub trait OcrEngine: Send {
    /// Short name for logs and error messages.
    fn name(&self) -> &str;

    /// Recognise the text on one page.
    ///
    /// Engines that know their intra-page progress call `progress` with
    /// increasing fractions; engines that don't may never call it.
    async fn recognize(
        &mut self,
        image: &PageImage,
        progress: PageProgress<'_>,
    ) -> Result<String, OcrError>;

    /// Release every resource the engine holds. Must be idempotent.
    fn terminate(&mut self);
}

/// Creates one engine per run.
#[async_trait]
pub trait OcrEngineFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn OcrEngine>, Pdf2SlidesError>;
}

/// Owns an engine for the duration of a run and terminates it on drop.
pub struct EngineGuard {
    engine: Option<Box<dyn OcrEngine>>,
}

impl EngineGuard {
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Borrow the engine. `None` only after [`EngineGuard::release`].
    pub fn engine(&mut self) -> Option<&mut (dyn OcrEngine + 'static)> {
        self.engine.as_deref_mut()
    }

    /// Terminate the engine now instead of at drop.
    pub fn release(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            debug!("Terminating OCR engine '{}'", engine.name());
            engine.terminate();
        }
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Recognises a sequence of page images with a single engine instance.
#[derive(Clone)]
pub struct TextRecognizer {
    factory: Arc<dyn OcrEngineFactory>,
}

impl TextRecognizer {
    pub fn new(factory: Arc<dyn OcrEngineFactory>) -> Self {
        Self { factory }
    }

    /// Recognise every image, in order. The result has exactly one entry per
    /// input image, carrying the same page number.
    ///
    /// `on_percent` receives the document-wide completion percentage. It is
    /// monotonic and called only when the integer value changes.
    pub async fn recognize(
        &self,
        images: &[PageImage],
        on_percent: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<Vec<RecognizedPage>, Pdf2SlidesError> {
        let mut guard = EngineGuard::new(self.factory.create().await?);
        let total = images.len();
        let mut meter = PercentMeter::new(total);
        let mut pages = Vec::with_capacity(total);

        for (i, image) in images.iter().enumerate() {
            let engine = guard
                .engine()
                .ok_or_else(|| Pdf2SlidesError::Internal("OCR engine already released".into()))?;

            let result = {
                let mut report = |fraction: f32| {
                    if let Some(p) = meter.update(i, fraction) {
                        on_percent(p);
                    }
                };
                engine.recognize(image, &mut report).await
            };

            match result {
                Ok(raw) => {
                    let text = clean_ocr_text(&raw);
                    debug!("Page {}: recognised {} chars", image.page, text.len());
                    pages.push(RecognizedPage::from_text(image.page, text));
                }
                Err(OcrError::PageFailed { page, detail }) => {
                    warn!("Page {}: OCR failed, continuing without it: {}", page, detail);
                    pages.push(RecognizedPage::failed(image.page, detail));
                }
                Err(OcrError::EngineFailed { page, detail }) => {
                    return Err(Pdf2SlidesError::OcrEngineFailed { page, detail });
                }
            }

            if let Some(p) = meter.update(i, 1.0) {
                on_percent(p);
            }
        }

        guard.release();

        let failed = pages.iter().filter(|p| p.is_failed()).count();
        info!("Recognised {} pages ({} failed)", pages.len(), failed);
        Ok(pages)
    }
}

/// Maps `(page index, fraction of that page)` onto a monotonic 0–100 value.
struct PercentMeter {
    total: usize,
    last: Option<u8>,
}

impl PercentMeter {
    fn new(total: usize) -> Self {
        Self { total, last: None }
    }

    /// Returns the new percentage if it differs from (and exceeds) the last one.
    fn update(&mut self, index: usize, fraction: f32) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let fraction = fraction.clamp(0.0, 1.0) as f64;
        let done = (index as f64 + fraction) / self.total as f64;
        let percent = (done * 100.0).floor().clamp(0.0, 100.0) as u8;
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageStatus;
    use image::{DynamicImage, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Engine scripted per page: `Ok(text)` or an error.
    struct ScriptedEngine {
        script: Vec<Result<String, OcrError>>,
        terminations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OcrEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn recognize(
            &mut self,
            image: &PageImage,
            progress: PageProgress<'_>,
        ) -> Result<String, OcrError> {
            progress(0.5);
            self.script[image.page - 1].clone()
        }

        fn terminate(&mut self) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptedFactory {
        script: Vec<Result<String, OcrError>>,
        terminations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OcrEngineFactory for ScriptedFactory {
        async fn create(&self) -> Result<Box<dyn OcrEngine>, Pdf2SlidesError> {
            Ok(Box::new(ScriptedEngine {
                script: self.script.clone(),
                terminations: Arc::clone(&self.terminations),
            }))
        }
    }

    fn images(n: usize) -> Vec<PageImage> {
        (1..=n)
            .map(|p| PageImage::new(p, DynamicImage::ImageRgba8(RgbaImage::new(2, 2))))
            .collect()
    }

    fn recognizer(script: Vec<Result<String, OcrError>>) -> (TextRecognizer, Arc<AtomicUsize>) {
        let terminations = Arc::new(AtomicUsize::new(0));
        let factory = ScriptedFactory {
            script,
            terminations: Arc::clone(&terminations),
        };
        (TextRecognizer::new(Arc::new(factory)), terminations)
    }

    #[tokio::test]
    async fn one_result_per_image_in_order() {
        let (rec, terminations) = recognizer(vec![
            Ok("alpha\r\n".into()),
            Ok("   ".into()),
            Ok("gamma".into()),
        ]);
        let pages = rec.recognize(&images(3), &|_| {}).await.unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.page).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(pages[0].text, "alpha");
        assert_eq!(pages[1].status, PageStatus::Empty);
        assert_eq!(pages[2].status, PageStatus::Recognized);
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn page_failure_is_tolerated_and_recorded() {
        let (rec, terminations) = recognizer(vec![
            Ok("first".into()),
            Err(OcrError::PageFailed {
                page: 2,
                detail: "exit status 1".into(),
            }),
        ]);
        let pages = rec.recognize(&images(2), &|_| {}).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(
            pages[1].status,
            PageStatus::Failed {
                detail: "exit status 1".into()
            }
        );
        assert!(pages[1].text.is_empty());
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn engine_failure_aborts_and_still_terminates() {
        let (rec, terminations) = recognizer(vec![
            Ok("first".into()),
            Err(OcrError::EngineFailed {
                page: 2,
                detail: "worker crashed".into(),
            }),
            Ok("never reached".into()),
        ]);
        let err = rec.recognize(&images(3), &|_| {}).await.unwrap_err();

        assert!(matches!(err, Pdf2SlidesError::OcrEngineFailed { page: 2, .. }));
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_deduplicated() {
        let (rec, _) = recognizer(vec![Ok("a".into()), Ok("b".into()), Ok("c".into())]);
        let seen = Mutex::new(Vec::new());
        rec.recognize(&images(3), &|p| seen.lock().unwrap().push(p))
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![16, 33, 50, 66, 83, 100]);
    }

    #[tokio::test]
    async fn empty_input_still_acquires_and_releases() {
        let (rec, terminations) = recognizer(vec![]);
        let pages = rec.recognize(&[], &|_| {}).await.unwrap();
        assert!(pages.is_empty());
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_terminates_once() {
        let terminations = Arc::new(AtomicUsize::new(0));
        let engine = ScriptedEngine {
            script: vec![],
            terminations: Arc::clone(&terminations),
        };
        let mut guard = EngineGuard::new(Box::new(engine));
        guard.release();
        drop(guard);
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn meter_handles_single_page() {
        let mut m = PercentMeter::new(1);
        assert_eq!(m.update(0, 0.0), Some(0));
        assert_eq!(m.update(0, 0.0), None);
        assert_eq!(m.update(0, 0.254), Some(25));
        assert_eq!(m.update(0, 1.0), Some(100));
        assert_eq!(m.update(0, 1.0), None);
    }
}
