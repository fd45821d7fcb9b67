//! Tesseract backend: one `tesseract` process per page.
//!
//! The factory probes `tesseract --version` once, so a missing binary fails
//! the run before any page is attempted. Each page is written as a PNG into
//! a scratch directory owned by the engine and recognised with
//!
//! ```text
//! tesseract <page.png> stdout -l <lang> --psm <mode>
//! ```
//!
//! A non-zero exit is a page failure. Failing to spawn the process at all
//! means the binary went away mid-run, which is an engine failure.
//! `terminate` removes the scratch directory.

use crate::error::{OcrError, Pdf2SlidesError};
use crate::output::PageImage;
use crate::pipeline::encode::encode_png;
use crate::pipeline::ocr::{OcrEngine, OcrEngineFactory, PageProgress};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Starts [`TesseractEngine`]s.
#[derive(Debug, Clone)]
pub struct TesseractFactory {
    binary: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractFactory {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>, psm: u8) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            psm,
        }
    }
}

#[async_trait]
impl OcrEngineFactory for TesseractFactory {
    async fn create(&self) -> Result<Box<dyn OcrEngine>, Pdf2SlidesError> {
        let unavailable = |detail: String| Pdf2SlidesError::OcrEngineUnavailable {
            engine: "tesseract".into(),
            detail,
        };

        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| unavailable(format!("cannot run '{}': {}", self.binary.display(), e)))?;
        if !output.status.success() {
            return Err(unavailable(format!(
                "'{} --version' exited with {}",
                self.binary.display(),
                output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout);
        info!(
            "Using {} (lang={}, psm={})",
            version.lines().next().unwrap_or("tesseract").trim(),
            self.language,
            self.psm
        );

        let scratch = tempfile::Builder::new()
            .prefix("pdf2slides-ocr-")
            .tempdir()
            .map_err(|e| unavailable(format!("cannot create scratch directory: {}", e)))?;

        Ok(Box::new(TesseractEngine {
            binary: self.binary.clone(),
            language: self.language.clone(),
            psm: self.psm,
            scratch: Some(scratch),
        }))
    }
}

/// A running Tesseract session: the binary plus a scratch directory.
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    psm: u8,
    scratch: Option<TempDir>,
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(
        &mut self,
        image: &PageImage,
        progress: PageProgress<'_>,
    ) -> Result<String, OcrError> {
        let page = image.page;
        let dir = self
            .scratch
            .as_ref()
            .map(|d| d.path().to_path_buf())
            .ok_or_else(|| OcrError::EngineFailed {
                page,
                detail: "engine already terminated".into(),
            })?;

        let png = encode_png(&image.image).map_err(|e| OcrError::PageFailed {
            page,
            detail: format!("PNG encoding failed: {}", e),
        })?;
        let path = dir.join(format!("page-{:04}.png", page));
        tokio::fs::write(&path, &png)
            .await
            .map_err(|e| OcrError::EngineFailed {
                page,
                detail: format!("cannot write {}: {}", path.display(), e),
            })?;
        progress(0.1);

        let output = Command::new(&self.binary)
            .args(tesseract_args(&path, &self.language, self.psm))
            .output()
            .await
            .map_err(|e| OcrError::EngineFailed {
                page,
                detail: format!("cannot run '{}': {}", self.binary.display(), e),
            })?;

        let _ = tokio::fs::remove_file(&path).await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::PageFailed {
                page,
                detail: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract page {}: {} bytes of text", page, text.len());
        progress(1.0);
        Ok(text)
    }

    fn terminate(&mut self) {
        if let Some(dir) = self.scratch.take() {
            debug!("Removing OCR scratch directory {}", dir.path().display());
            drop(dir);
        }
    }
}

/// Command-line arguments for recognising one image to stdout.
fn tesseract_args(image: &Path, language: &str, psm: u8) -> Vec<OsString> {
    vec![
        image.as_os_str().to_os_string(),
        "stdout".into(),
        "-l".into(),
        language.into(),
        "--psm".into(),
        psm.to_string().into(),
    ]
}
