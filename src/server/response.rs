//! Response envelope and HTTP error mapping.
//!
//! Every JSON response, success or failure, has the same shape:
//!
//! ```text
//! { "status": true|false, "message": "...", "body": <any|null>, "error": [...]? }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::AuthError;
use crate::error::{GatewayError, StorageError, TranscodeError};
use crate::validate::Violation;

/// Client-facing messages.
pub mod messages {
    pub const ADD: &str = "Data Add successfully";
    pub const LIST_SUCCESS: &str = "Data fetch successfully";
    pub const DELETE_SUCCESS: &str = "Data deleted successfully";
    pub const DATA_NOT_FOUND: &str = "No data found";
    pub const VALIDATION_ERROR: &str = "Validation error";
    pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
    pub const AUTH_ERROR: &str = "Auth Error: Authorization Token Required";
    pub const TOKEN_EXPIRE: &str = "Token Expire";
    pub const INVALID_TOKEN: &str = "Invalid Token";
    pub const NOT_AUTHORIZED: &str = "Not authorized for this API route";
    pub const SEND_OTP_TO_EMAIL: &str = "OTP has been sent successfully to registered email address.";
    pub const IMAGE_NOT_PROCESSABLE: &str = "Uploaded image could not be processed";
}

// =============================================================================
// Envelope
// =============================================================================

/// Standard response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: bool,
    pub message: String,
    pub body: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Vec<Violation>>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, body: Value) -> Self {
        Self {
            status: true,
            message: message.into(),
            body,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            body: Value::Null,
            error: None,
        }
    }

    /// 403 payload listing every violation.
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self {
            error: Some(violations),
            ..Self::failure(messages::VALIDATION_ERROR)
        }
    }

    /// Pair the envelope with an HTTP status.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error ({} violations)", .0.len())]
    Validation(Vec<Violation>),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gateway(GatewayError::Transcode(
                TranscodeError::Decode { .. } | TranscodeError::Unsupported(_),
            )) => StatusCode::BAD_REQUEST,
            AppError::Gateway(GatewayError::Storage(StorageError::NotFound(_))) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Storage(_) | AppError::Gateway(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Provider details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Gateway(GatewayError::Transcode(
                TranscodeError::Decode { .. } | TranscodeError::Unsupported(_),
            )) => messages::IMAGE_NOT_PROCESSABLE.to_string(),
            _ if self.status() == StatusCode::NOT_FOUND => messages::DATA_NOT_FOUND.to_string(),
            _ => messages::INTERNAL_SERVER_ERROR.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            AppError::Auth(err) => err.into_response(),
            AppError::Validation(violations) => {
                warn!(status = status.as_u16(), violations = violations.len(), "Validation failed");
                ApiResponse::validation(violations).into_response_with(status)
            }
            other => {
                if status.is_server_error() {
                    error!(status = status.as_u16(), error = %other, "Server error");
                } else if status == StatusCode::NOT_FOUND {
                    debug!(status = status.as_u16(), error = %other, "Resource not found");
                } else {
                    warn!(status = status.as_u16(), error = %other, "Client error");
                }

                ApiResponse::failure(other.client_message()).into_response_with(status)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
