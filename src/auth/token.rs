//! HS256 token issuing and verification.
//!
//! Tokens carry the caller's identity in a `data` claim next to the standard
//! `exp`:
//!
//! ```text
//! { "data": { "id": "...", "role": "admin", ... }, "exp": 1735689600 }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AuthError;

/// Extra lifetime of refresh tokens over access tokens, in seconds.
pub const REFRESH_EXTRA_SECS: i64 = 120;

/// Longest accepted access token lifetime (one year).
pub const MAX_TOKEN_LIFETIME_MINUTES: u64 = 365 * 24 * 60;

/// Authenticated caller, as carried in the token's `data` claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub role: String,

    /// Any other fields the issuer put in the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            extra: Map::new(),
        }
    }
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub data: Identity,
    /// Expiry, Unix seconds
    pub exp: i64,
}

/// Extract the token from an `Authorization` header value.
///
/// Only the `Bearer ` scheme is recognised.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

// =============================================================================
// Verification
// =============================================================================

/// Verifies HS256 tokens against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    /// Verify a raw token and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.data)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Verify the value of an `Authorization` header.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = header.and_then(bearer_token).ok_or(AuthError::MissingToken)?;
        self.verify(token)
    }
}

// =============================================================================
// Issuing
// =============================================================================

/// Signs access and refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Create an issuer whose access tokens live `lifetime_minutes`.
    ///
    /// Lifetimes above [`MAX_TOKEN_LIFETIME_MINUTES`] are capped.
    pub fn new(secret: impl AsRef<[u8]>, lifetime_minutes: u64) -> Self {
        let minutes = lifetime_minutes.min(MAX_TOKEN_LIFETIME_MINUTES) as i64;
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            lifetime: Duration::try_minutes(minutes).unwrap_or(Duration::zero()),
        }
    }

    /// Lifetime of access tokens.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign an access token.
    pub fn issue(&self, identity: &Identity) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(identity, self.lifetime)
    }

    /// Sign a refresh token; it outlives the access token by two minutes.
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(identity, self.lifetime + Duration::seconds(REFRESH_EXTRA_SECS))
    }

    /// Sign a token with an explicit lifetime (may be negative).
    ///
    /// Fails when the resulting expiry is not a representable timestamp.
    pub fn issue_with_lifetime(
        &self,
        identity: &Identity,
        lifetime: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(identity, lifetime)
    }

    fn sign(&self, identity: &Identity, lifetime: Duration) -> Result<String, jsonwebtoken::errors::Error> {
        let expires_at = Utc::now()
            .checked_add_signed(lifetime)
            .ok_or(ErrorKind::InvalidToken)?;
        let claims = Claims {
            data: identity.clone(),
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}

// =============================================================================
// Tests
// =============================================================================
