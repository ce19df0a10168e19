//! Bearer token authentication.
//!
//! Each request moves through a small state machine:
//!
//! ```text
//! no header ──► MissingToken
//! "Bearer <t>" ──► verify(t) ──┬─► Identity (inserted into extensions)
//!                              ├─► TokenExpired
//!                              └─► InvalidToken
//! Identity ──► authorize_role ──┬─► next handler
//!                               └─► NotAuthorized
//! ```
//!
//! Every rejection is answered with HTTP 401 and the standard envelope.

mod middleware;
pub mod otp;
mod token;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use crate::server::{messages, ApiResponse};

pub use middleware::{auth_middleware, authorize_role, AllowedRoles};
pub use otp::{generate_otp, otp_expiration, Otp, OtpError, MAX_OTP_LIFETIME_MINUTES, OTP_LENGTH};
pub use token::{
    bearer_token, Claims, Identity, TokenIssuer, TokenVerifier, MAX_TOKEN_LIFETIME_MINUTES,
    REFRESH_EXTRA_SECS,
};

/// Why a request was not let through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, or one without the `Bearer ` scheme
    #[error("Auth Error: Authorization Token Required")]
    MissingToken,

    /// Signature is fine but `exp` is in the past
    #[error("Token Expire")]
    TokenExpired,

    /// Anything else: bad signature, garbage, wrong algorithm
    #[error("Invalid Token")]
    InvalidToken,

    /// Authenticated, but the role is not allowed on this route
    #[error("Not authorized for this API route")]
    NotAuthorized,
}

impl AuthError {
    /// Short machine-readable tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidToken => "invalid_token",
            AuthError::NotAuthorized => "not_authorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;

        // Bad signatures and role probing are worth a warning; expiry is routine
        match &self {
            AuthError::InvalidToken | AuthError::NotAuthorized => {
                warn!(error_type = self.kind(), status = status.as_u16(), "Authentication failed: {}", self);
            }
            _ => {
                debug!(error_type = self.kind(), status = status.as_u16(), "Authentication failed: {}", self);
            }
        }

        let message = match self {
            AuthError::MissingToken => messages::AUTH_ERROR,
            AuthError::TokenExpired => messages::TOKEN_EXPIRE,
            AuthError::InvalidToken => messages::INVALID_TOKEN,
            AuthError::NotAuthorized => messages::NOT_AUTHORIZED,
        };

        ApiResponse::failure(message).into_response_with(status)
    }
}
