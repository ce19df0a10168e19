//! Image normalization and thumbnail encoding.
//!
//! # Design Decisions
//!
//! - **Pass-through by default**: only HEIC inputs are decoded during
//!   normalization. Every other format is stored byte-for-byte.
//!
//! - **Cover resize**: thumbnails fill the target box exactly and are
//!   centre-cropped, so every thumbnail of a preset has the same dimensions.
//!
//! - **Format follows input**: PNG inputs produce PNG thumbnails at the best
//!   compression level; everything else is encoded as JPEG at quality 100.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::DynamicImage;

use super::heic::{decode_heic, is_heic_extension};
use crate::error::TranscodeError;
use crate::validate::UploadedFile;

/// JPEG quality used when converting HEIC originals.
pub const HEIC_CONVERSION_QUALITY: u8 = 92;

/// JPEG quality used for thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Thumbnail Sizes
// =============================================================================

/// Thumbnail box presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailSize {
    /// 320×240
    #[default]
    MediumSmall,
    /// 480×360
    Medium,
    /// 640×480
    MediumLarge,
}

impl ThumbnailSize {
    /// Width and height of the box in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ThumbnailSize::MediumSmall => (320, 240),
            ThumbnailSize::Medium => (480, 360),
            ThumbnailSize::MediumLarge => (640, 480),
        }
    }
}

/// Image bytes after normalization, with the extension of their final format.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Bytes,
    pub extension: String,
}

impl NormalizedImage {
    /// Content type to store the bytes with.
    pub fn content_type(&self) -> String {
        content_type_for(&self.extension)
    }
}

// =============================================================================
// Transcoder
// =============================================================================

/// Converts uploaded images to storable formats and renders thumbnails.
#[derive(Debug, Clone, Default)]
pub struct MediaTranscoder {
    thumbnail_size: ThumbnailSize,
}

impl MediaTranscoder {
    /// Create a transcoder producing "mediumSmall" thumbnails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different thumbnail preset.
    pub fn with_thumbnail_size(mut self, size: ThumbnailSize) -> Self {
        self.thumbnail_size = size;
        self
    }

    /// The configured thumbnail preset.
    pub fn thumbnail_size(&self) -> ThumbnailSize {
        self.thumbnail_size
    }

    /// Convert camera-native HEIC to JPEG; pass anything else through.
    ///
    /// The returned extension reflects the final format.
    pub fn normalize(&self, file: &UploadedFile) -> Result<NormalizedImage, TranscodeError> {
        let extension = file.extension();

        if !is_heic_extension(&extension) {
            return Ok(NormalizedImage {
                bytes: file.data.clone(),
                extension,
            });
        }

        let img = decode_heic(&file.data)?;
        let bytes = encode_jpeg(&img, HEIC_CONVERSION_QUALITY)?;

        Ok(NormalizedImage {
            bytes,
            extension: "jpeg".to_string(),
        })
    }

    /// Resize to the thumbnail box and re-encode.
    ///
    /// `extension` is the extension of the normalized source and selects the
    /// output encoding (PNG stays PNG, everything else becomes JPEG).
    pub fn thumbnail(&self, source: &[u8], extension: &str) -> Result<Bytes, TranscodeError> {
        let img = image::load_from_memory(source).map_err(|e| TranscodeError::Decode {
            format: extension.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = self.thumbnail_size.dimensions();
        let resized = img.resize_to_fill(width, height, FilterType::Lanczos3);

        if extension == "png" {
            encode_png(&resized)
        } else {
            encode_jpeg(&resized, THUMBNAIL_JPEG_QUALITY)
        }
    }
}

/// Media type of an image stored with `extension`.
///
/// `jpg` is not a registered subtype and maps to `image/jpeg`.
pub fn content_type_for(extension: &str) -> String {
    match extension {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{}", other),
    }
}

/// Extension under which a thumbnail of a `source_extension` image is stored.
pub fn thumbnail_extension(source_extension: &str) -> &str {
    match source_extension {
        "png" => "png",
        "jpg" => "jpg",
        _ => "jpeg",
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, TranscodeError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| TranscodeError::Encode {
            format: "jpeg".to_string(),
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

fn encode_png(img: &DynamicImage) -> Result<Bytes, TranscodeError> {
    let mut output = Cursor::new(Vec::new());
    let encoder =
        PngEncoder::new_with_quality(&mut output, CompressionType::Best, PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| TranscodeError::Encode {
            format: "png".to_string(),
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output.into_inner()))
}

// =============================================================================
// Tests
// =============================================================================
