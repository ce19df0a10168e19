use thiserror::Error;

/// Errors returned by a blob store backend
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Error from S3 or S3-compatible storage while writing an object
    #[error("Upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    /// Presigned URL could not be produced
    #[error("Presign failed for {key}: {message}")]
    Presign { key: String, message: String },

    /// Delete request was rejected by the provider
    #[error("Delete failed for {key}: {message}")]
    Delete { key: String, message: String },

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Errors raised while converting or thumbnailing an image
#[derive(Debug, Clone, Error)]
pub enum TranscodeError {
    /// Source bytes could not be decoded
    #[error("Failed to decode {format} image: {message}")]
    Decode { format: String, message: String },

    /// Output could not be encoded
    #[error("Failed to encode {format} image: {message}")]
    Encode { format: String, message: String },

    /// Input format is recognised but this build cannot process it
    #[error("Unsupported image format: {0}")]
    Unsupported(String),

    /// The blocking worker running the conversion did not complete
    #[error("Transcoding task failed: {0}")]
    Task(String),
}

/// Errors from the upload pipeline (transcode + store)
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),
}
