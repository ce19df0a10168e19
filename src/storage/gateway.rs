//! Upload pipeline and signed URL resolution.
//!
//! For every uploaded file the gateway:
//!
//! 1. normalizes it (HEIC → JPEG),
//! 2. uploads the original under a fresh key,
//! 3. renders a thumbnail and uploads it under a sibling key.
//!
//! Files of a batch are processed one after another and the returned key
//! lists follow input order. There is no rollback: if a later step fails,
//! objects written by earlier steps stay in the bucket.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::keys::{generate_key, KeyVariant, Owner};
use super::{BlobStore, SignedUrl, SIGNED_URL_TTL};
use crate::error::{GatewayError, StorageError, TranscodeError};
use crate::media::{content_type_for, thumbnail_extension, MediaTranscoder, NormalizedImage};
use crate::validate::UploadedFile;

// =============================================================================
// Types
// =============================================================================

/// What to do when a thumbnail cannot be rendered after the original was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ThumbnailFailurePolicy {
    /// Fail the whole request
    Fail,
    /// Keep the original and continue without a thumbnail
    #[default]
    Skip,
}

/// Keys written for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    pub key: String,

    /// None when thumbnailing was skipped
    pub thumbnail_key: Option<String>,
}

/// Keys written for a list of files, aligned with the input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoredBatch {
    pub original_keys: Vec<String>,
    pub thumbnail_keys: Vec<Option<String>>,
}

impl StoredBatch {
    fn push(&mut self, upload: StoredUpload) {
        self.original_keys.push(upload.key);
        self.thumbnail_keys.push(upload.thumbnail_key);
    }

    /// The first stored file, for single-file callers.
    pub fn first(&self) -> Option<StoredUpload> {
        let key = self.original_keys.first()?.clone();
        let thumbnail_key = self.thumbnail_keys.first().cloned().flatten();
        Some(StoredUpload { key, thumbnail_key })
    }

    pub fn len(&self) -> usize {
        self.original_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_keys.is_empty()
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Stores uploads in a [`BlobStore`] and hands out signed read URLs.
pub struct ObjectStoreGateway<B: BlobStore> {
    store: Arc<B>,
    transcoder: MediaTranscoder,
    thumbnail_policy: ThumbnailFailurePolicy,
}

impl<B: BlobStore> ObjectStoreGateway<B> {
    /// Create a gateway with the default transcoder and the `skip` policy.
    pub fn new(store: B) -> Self {
        Self {
            store: Arc::new(store),
            transcoder: MediaTranscoder::new(),
            thumbnail_policy: ThumbnailFailurePolicy::default(),
        }
    }

    /// Set the thumbnail failure policy.
    pub fn with_thumbnail_policy(mut self, policy: ThumbnailFailurePolicy) -> Self {
        self.thumbnail_policy = policy;
        self
    }

    /// Replace the transcoder.
    pub fn with_transcoder(mut self, transcoder: MediaTranscoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Underlying blob store.
    pub fn blob_store(&self) -> &B {
        &self.store
    }

    pub fn thumbnail_policy(&self) -> ThumbnailFailurePolicy {
        self.thumbnail_policy
    }

    /// Store one file and its thumbnail.
    pub async fn store(
        &self,
        file: &UploadedFile,
        doc_type: &str,
        owner: &Owner,
    ) -> Result<StoredUpload, GatewayError> {
        let normalized = self.normalize(file).await?;
        let key = self.store_original(&normalized, doc_type, owner).await?;

        let thumbnail_key = match self.store_thumbnail(&normalized, doc_type, owner).await {
            Ok(key) => Some(key),
            Err(GatewayError::Transcode(e)) if self.thumbnail_policy == ThumbnailFailurePolicy::Skip => {
                warn!(
                    file = %file.name,
                    original_key = %key,
                    error = %e,
                    "Thumbnail skipped"
                );
                None
            }
            Err(e) => return Err(e),
        };

        Ok(StoredUpload { key, thumbnail_key })
    }

    /// Store several files under the same doc type, sequentially.
    ///
    /// Stops at the first failure; files stored before it are not removed.
    pub async fn store_many(
        &self,
        files: &[UploadedFile],
        doc_type: &str,
        owner: &Owner,
    ) -> Result<StoredBatch, GatewayError> {
        let mut batch = StoredBatch::default();

        for file in files {
            let stored = self.store(file, doc_type, owner).await?;
            batch.push(stored);
        }

        info!(
            doc_type = doc_type,
            owner_kind = %owner.kind,
            owner_id = %owner.id,
            files = batch.len(),
            "Stored upload batch"
        );

        Ok(batch)
    }

    /// Upload normalized bytes as the original object.
    pub async fn store_original(
        &self,
        image: &NormalizedImage,
        doc_type: &str,
        owner: &Owner,
    ) -> Result<String, GatewayError> {
        let key = generate_key(owner, doc_type, KeyVariant::Original, &image.extension);
        self.store
            .put(&key, image.bytes.clone(), &image.content_type())
            .await?;
        Ok(key)
    }

    /// Render and upload the thumbnail of normalized bytes.
    pub async fn store_thumbnail(
        &self,
        image: &NormalizedImage,
        doc_type: &str,
        owner: &Owner,
    ) -> Result<String, GatewayError> {
        let transcoder = self.transcoder.clone();
        let source = image.bytes.clone();
        let extension = image.extension.clone();

        let thumbnail = tokio::task::spawn_blocking(move || transcoder.thumbnail(&source, &extension))
            .await
            .map_err(|e| TranscodeError::Task(e.to_string()))??;

        let extension = thumbnail_extension(&image.extension);
        let key = generate_key(owner, doc_type, KeyVariant::Thumbnail, extension);
        self.store
            .put(&key, thumbnail, &content_type_for(extension))
            .await?;
        Ok(key)
    }

    async fn normalize(&self, file: &UploadedFile) -> Result<NormalizedImage, TranscodeError> {
        let transcoder = self.transcoder.clone();
        let file = file.clone();
        tokio::task::spawn_blocking(move || transcoder.normalize(&file))
            .await
            .map_err(|e| TranscodeError::Task(e.to_string()))?
    }

    /// Signed URL for a key; no key (or an empty one) yields the empty value.
    pub async fn resolve(&self, key: Option<&str>) -> Result<SignedUrl, StorageError> {
        let key = match key {
            Some(key) if !key.is_empty() => key,
            _ => return Ok(SignedUrl::empty()),
        };

        let url = self.store.presign_get(key, SIGNED_URL_TTL).await?;
        Ok(SignedUrl {
            key: key.to_string(),
            url,
        })
    }

    /// Signed URLs for several keys, in input order.
    pub async fn resolve_many<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<SignedUrl>, StorageError> {
        let mut urls = Vec::with_capacity(keys.len());
        for key in keys {
            urls.push(self.resolve(Some(key.as_ref())).await?);
        }
        Ok(urls)
    }

    /// Delete an object. Returns false without contacting the store for an empty key.
    pub async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        if key.is_empty() {
            return Ok(false);
        }

        self.store.delete(key).await?;
        debug!(key = key, "Removed object");
        Ok(true)
    }
}

impl<B: BlobStore> Clone for ObjectStoreGateway<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transcoder: self.transcoder.clone(),
            thumbnail_policy: self.thumbnail_policy,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
