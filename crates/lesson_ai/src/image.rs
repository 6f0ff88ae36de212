//! Image preparation for vision requests.
//!
//! Photos are clamped to the upload bounds, flattened to RGB and re-encoded as
//! JPEG before being inlined as base64 data URLs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use lesson_core::LessonError;

pub const MAX_WIDTH: u32 = 768;
pub const MAX_HEIGHT: u32 = 1024;
const JPEG_QUALITY: u8 = 85;
const JPEG_MIME: &str = "image/jpeg";

/// An image ready to be sent inline with a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data_base64: String,
}

impl ImageAttachment {
    pub fn jpeg(bytes: &[u8]) -> Self {
        Self {
            mime_type: JPEG_MIME.into(),
            data_base64: encode_base64(bytes),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// Width and height are capped independently; aspect ratio is not preserved.
pub fn clamp_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.min(MAX_WIDTH), height.min(MAX_HEIGHT))
}

/// Decode PNG or JPEG bytes, clamp to the upload bounds and re-encode as JPEG.
pub fn resize_for_upload(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;

    match reader.format() {
        Some(ImageFormat::Png | ImageFormat::Jpeg) => {}
        Some(other) => return Err(format!("unsupported image format {other:?}")),
        None => return Err("unrecognised image format".into()),
    }

    let img = reader.decode().map_err(|e| e.to_string())?;
    let (width, height) = clamp_dimensions(img.width(), img.height());
    let img = if (width, height) != (img.width(), img.height()) {
        debug!(
            "Resizing image {}x{} -> {width}x{height}",
            img.width(),
            img.height()
        );
        img.resize_exact(width, height, FilterType::CatmullRom)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Read one photo from disk and turn it into an upload-ready attachment.
pub fn prepare_attachment(path: &Path) -> Result<ImageAttachment, LessonError> {
    let bytes = std::fs::read(path).map_err(|e| LessonError::image(path, e))?;
    let jpeg = resize_for_upload(&bytes).map_err(|e| LessonError::image(path, e))?;
    Ok(ImageAttachment::jpeg(&jpeg))
}

/// Prepare every photo in order; the first failure aborts.
pub fn prepare_attachments<P: AsRef<Path>>(
    paths: &[P],
) -> Result<Vec<ImageAttachment>, LessonError> {
    paths
        .iter()
        .map(|p| prepare_attachment(p.as_ref()))
        .collect()
}
