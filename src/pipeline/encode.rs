//! Image encoding for the OCR engines.
//!
//! Tesseract reads PNG files from disk; the vision backend sends a base64
//! PNG inside the chat request. PNG is lossless, so rendered glyph edges
//! reach the recogniser exactly as pdfium drew them.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded image → {} bytes PNG", buf.len());
    Ok(buf)
}

/// Encode a rendered page as a base64 PNG ready for a vision model.
///
/// `detail: "high"` keeps small print legible for OpenAI-style tiling.
pub fn encode_for_vision(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let png = encode_png(img)?;
    let b64 = STANDARD.encode(&png);
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
