//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## All or nothing
//!
//! A single page that fails to render aborts the whole rasterisation. There
//! is no partial page set: downstream stages assume one image per page.

use crate::config::PipelineConfig;
use crate::error::Pdf2SlidesError;
use crate::output::PageImage;
use crate::pipeline::input::RawDocument;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Called with `(page, total)` once per page, before that page is rendered.
pub type PageCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Turns a PDF buffer into one image per page, in page order.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render every page. `images[i].page == i + 1` on success.
    async fn rasterize(
        &self,
        document: RawDocument,
        on_page: PageCallback,
    ) -> Result<Vec<PageImage>, Pdf2SlidesError>;
}

/// pdfium-backed rasteriser.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    scale: f32,
    max_pixels: u32,
    password: Option<String>,
    library: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            scale: config.render_scale,
            max_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
            library: config.pdfium_library.clone(),
        }
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn rasterize(
        &self,
        document: RawDocument,
        on_page: PageCallback,
    ) -> Result<Vec<PageImage>, Pdf2SlidesError> {
        let settings = self.clone();
        let bytes = document.into_bytes();

        tokio::task::spawn_blocking(move || settings.render_blocking(&bytes, on_page.as_ref()))
            .await
            .map_err(|e| Pdf2SlidesError::Internal(format!("Render task panicked: {}", e)))?
    }
}

impl PdfiumRasterizer {
    fn bind(&self) -> Result<Pdfium, Pdf2SlidesError> {
        let bindings = match &self.library {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| Pdf2SlidesError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }

    fn render_blocking(
        &self,
        bytes: &[u8],
        on_page: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<Vec<PageImage>, Pdf2SlidesError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| classify_load_error(&format!("{:?}", e), password.is_some()))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let render_config = render_config(self.scale, self.max_pixels);
        let mut results = Vec::with_capacity(total_pages);

        for idx in 0..total_pages {
            let page_num = idx + 1;
            on_page(page_num, total_pages);

            let page = pages
                .get(idx as u16)
                .map_err(|e| Pdf2SlidesError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                })?;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Pdf2SlidesError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                page_num,
                image.width(),
                image.height()
            );

            results.push(PageImage::new(page_num, image));
        }

        Ok(results)
    }
}

/// Render settings: scale each page by `scale`, capped at `max_pixels` per edge.
fn render_config(scale: f32, max_pixels: u32) -> PdfRenderConfig {
    PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32)
}

/// Map a pdfium load failure onto the password / corrupt-file variants.
fn classify_load_error(detail: &str, password_given: bool) -> Pdf2SlidesError {
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            Pdf2SlidesError::WrongPassword
        } else {
            Pdf2SlidesError::PasswordRequired
        }
    } else {
        Pdf2SlidesError::CorruptPdf {
            detail: detail.to_string(),
        }
    }
}
