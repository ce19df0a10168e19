//! # Media Gateway
//!
//! An authenticated upload gateway for images stored in S3-compatible object
//! storage.
//!
//! Requests carry a bearer token. Upload routes validate every multipart file
//! (presence, mime type, size) and the accompanying text fields before any
//! side effect. Accepted images are normalized (HEIC becomes JPEG), stored
//! under collision-free keys together with a 320×240 thumbnail, and returned
//! to the caller as time-limited signed URLs.
//!
//! ## Architecture
//!
//! - [`validate`] - Upload constraints and JSON body schemas
//! - [`media`] - HEIC conversion and thumbnail rendering
//! - [`storage`] - Blob store abstraction, S3 backend and the upload gateway
//! - [`auth`] - Bearer token verification, role checks and one-time codes
//! - [`mail`] - HTML email over SMTP
//! - [`server`] - Axum router, handlers and the response envelope
//! - [`config`] - CLI and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use media_gateway::{create_router, create_s3_client, AppState, ObjectStoreGateway, RouterConfig, S3BlobStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1", None).await;
//!     let gateway = ObjectStoreGateway::new(S3BlobStore::new(client, "uploads"));
//!     let router = create_router(AppState::new(gateway), RouterConfig::new("jwt-secret"));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod media;
pub mod server;
pub mod storage;
pub mod validate;

// Re-export commonly used types
pub use auth::{
    auth_middleware, authorize_role, AllowedRoles, AuthError, Identity, Otp, TokenIssuer,
    TokenVerifier,
};
pub use config::{CheckConfig, Cli, Command, S3Args, ServeConfig, TokenConfig};
pub use error::{GatewayError, StorageError, TranscodeError};
pub use mail::{MailError, Mailer};
pub use media::{MediaTranscoder, NormalizedImage, ThumbnailSize};
pub use server::{create_router, ApiResponse, AppError, AppState, RouterConfig};
pub use storage::{
    create_s3_client, BlobStore, KeyVariant, ObjectStoreGateway, Owner, S3BlobStore, SignedUrl,
    StoredBatch, StoredUpload, ThumbnailFailurePolicy, SIGNED_URL_TTL,
};
pub use validate::{
    validate_body, validate_upload, BodySchema, MimePattern, UploadBatch, UploadSpec, UploadedFile,
    Violation,
};
