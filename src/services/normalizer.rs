use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// An uploaded image re-encoded into a known format, ready to send to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub format: ImageFormat,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn is_empty(&self) -> bool {
        self.base64.is_empty()
    }
}

/// Normalize to the default JPEG payload.
#[cfg(test)]
pub fn normalize_jpeg(content: Option<&[u8]>) -> Option<EncodedImage> {
    normalize(content, ImageFormat::Jpeg)
}

/// Decode arbitrary image bytes and re-encode them as base64 in `format`.
///
/// Never fails loudly: corrupt, unsupported or missing input is logged and
/// reported as `None`, which callers treat as "image unusable".
pub fn normalize(content: Option<&[u8]>, format: ImageFormat) -> Option<EncodedImage> {
    let content = match content {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            log::warn!("⚠️ No image content to normalize");
            return None;
        }
    };

    match reencode(content, format) {
        Ok(bytes) => {
            let base64 = general_purpose::STANDARD.encode(&bytes);
            log::debug!(
                "🔄 Normalized image: {} bytes in, {} bytes {:?}, {} base64 chars",
                content.len(),
                bytes.len(),
                format,
                base64.len()
            );
            Some(EncodedImage { base64, format })
        }
        Err(e) => {
            log::warn!("❌ Error extracting base64 from image: {:#}", e);
            None
        }
    }
}

fn reencode(content: &[u8], format: ImageFormat) -> Result<Vec<u8>> {
    let mut img = image::load_from_memory(content).context("failed to decode image")?;

    // JPEG has no alpha channel and only 8-bit RGB/L encoders
    if format == ImageFormat::Jpeg && img.color() != ColorType::Rgb8 {
        img = DynamicImage::ImageRgb8(img.to_rgb8());
    }

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .with_context(|| format!("failed to encode image as {:?}", format))?;
    Ok(buffer.into_inner())
}
