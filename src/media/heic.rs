//! HEIC/HEIF decoding.
//!
//! Decoding goes through the system libheif and is only compiled with the
//! `heic` cargo feature. Without it every HEIC input is rejected with
//! [`TranscodeError::Unsupported`].

use image::DynamicImage;

use crate::error::TranscodeError;

/// Returns true for mimetype extensions handled by this module.
pub fn is_heic_extension(extension: &str) -> bool {
    matches!(extension, "heic" | "heif")
}

/// Decode the primary image of a HEIC container to RGB pixels.
#[cfg(feature = "heic")]
pub fn decode_heic(data: &[u8]) -> Result<DynamicImage, TranscodeError> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let decode_err = |message: String| TranscodeError::Decode {
        format: "heic".to_string(),
        message,
    };

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data).map_err(|e| decode_err(e.to_string()))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| decode_err(e.to_string()))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| decode_err(e.to_string()))?;

    let width = decoded.width();
    let height = decoded.height();
    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| decode_err("missing interleaved RGB plane".to_string()))?;

    // Rows may be padded; copy the visible part of each one.
    let row_len = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }

    image::RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| decode_err("pixel buffer does not match image dimensions".to_string()))
}

/// Decode the primary image of a HEIC container to RGB pixels.
#[cfg(not(feature = "heic"))]
pub fn decode_heic(_data: &[u8]) -> Result<DynamicImage, TranscodeError> {
    Err(TranscodeError::Unsupported(
        "heic (built without the `heic` feature)".to_string(),
    ))
}
