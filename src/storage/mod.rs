//! Object storage layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          ObjectStoreGateway             │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  Key builder │  │ MediaTranscoder │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         BlobStore (S3BlobStore)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! - [`BlobStore`]: key-addressed put / presign / delete
//! - [`S3BlobStore`]: aws-sdk-s3 implementation
//! - [`ObjectStoreGateway`]: the upload pipeline and signed URL resolution
//! - [`keys`]: object key layout

mod gateway;
pub mod keys;
mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::StorageError;

pub use gateway::{ObjectStoreGateway, StoredBatch, StoredUpload, ThumbnailFailurePolicy};
pub use keys::{KeyVariant, Owner};
pub use s3::{create_s3_client, S3BlobStore};

/// Lifetime of signed read URLs (6 hours).
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// A key together with a time-limited read URL.
///
/// The empty value (`key` and `url` both empty) stands for "no attachment".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub key: String,
    pub url: String,
}

impl SignedUrl {
    /// The "no attachment" value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True for the "no attachment" value.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Key-addressed blob storage.
///
/// Implementations must be safe to share across requests; every object is
/// addressed independently so no coordination is needed between calls.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Write `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Produce a credential-less GET URL for `key` valid for `ttl`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Delete the object under `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Bucket (or namespace) the store writes to.
    fn bucket(&self) -> &str;
}
