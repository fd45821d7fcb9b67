//! Pipeline stages for PDF-to-presentation conversion.
//!
//! Each submodule implements one transformation step, so each can be tested
//! on its own and swapped (a different OCR engine, a different model
//! backend) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ aggregate ──▶ generate
//! (path/URL) (pdfium)  (per page) (join)      (LLM + validation)
//! ```
//!
//! 1. [`input`]    : load and validate the PDF bytes (signature, size ceiling)
//! 2. [`render`]   : rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`ocr`]      : recognise page text in order with one engine per run;
//!    engines live in [`tesseract`] and [`vision`], image encoding in
//!    [`encode`], text cleanup in [`postprocess`]
//! 4. [`aggregate`]: join page texts and reject documents with no text
//! 5. [`generate`] : one schema-constrained call through [`llm`] or
//!    [`gemini`], then local validation of the reply

pub mod aggregate;
pub mod encode;
pub mod gemini;
pub mod generate;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod render;
pub mod tesseract;
pub mod vision;
