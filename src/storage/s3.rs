use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, error, info};

use super::BlobStore;
use crate::error::StorageError;

/// S3-backed implementation of [`BlobStore`].
///
/// Works against AWS S3 or any S3-compatible service (MinIO, etc.). All
/// objects are written to a single bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a store writing to `bucket`.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        let size = data.len();
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                error!(
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    error = %e,
                    "S3 upload failed"
                );
                StorageError::Upload {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let presign_err = |message: String| StorageError::Presign {
            key: key.to_string(),
            message,
        };

        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| presign_err(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, error = %e, "S3 presign failed");
                presign_err(e.to_string())
            })?;

        debug!(bucket = %self.bucket, key = %key, ttl_secs = ttl.as_secs(), "Issued signed URL");

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                // S3 answers 204 for absent keys, so a 404 here means the bucket is gone
                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if status_is_404 {
                    return StorageError::NotFound(format!("s3://{}/{}", self.bucket, key));
                }

                error!(bucket = %self.bucket, key = %key, error = %e, "S3 delete failed");
                StorageError::Delete {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!(bucket = %self.bucket, key = %key, "S3 delete successful");

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Create an S3 client.
///
/// Explicit credentials are used when both parts are given; otherwise the
/// default AWS provider chain applies (environment, profile, IMDS).
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1", None).await;
/// ```
pub async fn create_s3_client(
    endpoint_url: Option<&str>,
    region: &str,
    credentials: Option<(&str, &str)>,
) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    if let Some((access_key_id, secret_access_key)) = credentials {
        config_loader = config_loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "media-gateway-config",
        ));
    }

    let sdk_config = config_loader.load().await;

    // For S3-compatible services, we often need to use path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
