//! Media transcoding.
//!
//! Sits between the upload handlers and the object store gateway:
//!
//! ```text
//! UploadedFile ──► normalize ──► original bytes (+ final extension)
//!                      │
//!                      └──────► thumbnail ──► 320×240 PNG/JPEG
//! ```
//!
//! - [`MediaTranscoder`]: HEIC → JPEG conversion and thumbnail rendering
//! - [`ThumbnailSize`]: box presets (`mediumSmall` is used for uploads)

mod heic;
mod transcode;

pub use heic::{decode_heic, is_heic_extension};
pub use transcode::{
    content_type_for, thumbnail_extension, MediaTranscoder, NormalizedImage, ThumbnailSize,
    HEIC_CONVERSION_QUALITY, THUMBNAIL_JPEG_QUALITY,
};
