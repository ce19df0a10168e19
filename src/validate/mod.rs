//! Request validation.
//!
//! Two independent checks run before any side effect happens:
//!
//! - [`validate_upload`] checks the files of a multipart request against the
//!   per-route [`UploadSpec`] declarations (presence, mime type, size).
//! - [`validate_body`] decodes a JSON payload into a typed schema and runs its
//!   `validator` rules, collecting every violation instead of the first one.
//!   Schemas implement [`BodySchema`] to name their fields by payload key.
//!
//! Both return the full list of [`Violation`]s; mapping a non-empty list to a
//! client error response is the caller's job.

mod body;
pub mod schemas;
mod upload;

use serde::Serialize;
use serde_json::Value;

pub use body::{validate_body, BodySchema};
pub use upload::{
    validate_upload, MimePattern, SpecParseError, UploadBatch, UploadSpec, UploadedFile,
    IMAGE_MIME_TYPES, MAX_UPLOAD_BYTES,
};

/// A single validation failure as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Human-readable message
    pub messages: String,

    /// Field the violation originates from (body validation only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ViolationContext>,
}

/// Origin of a body violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationContext {
    /// Field name as it appears in the payload
    pub key: String,

    /// Display label; equal to the key for flat schemas
    pub label: String,

    /// Offending value, when the rule reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Violation {
    /// Create a violation without field context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: message.into(),
            context: None,
        }
    }

    /// Create a violation tied to a payload field.
    pub fn for_field(message: impl Into<String>, key: impl Into<String>, value: Option<Value>) -> Self {
        let key = key.into();
        Self {
            messages: message.into(),
            context: Some(ViolationContext {
                label: key.clone(),
                key,
                value,
            }),
        }
    }
}
