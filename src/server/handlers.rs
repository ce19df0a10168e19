//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/test/image-upload` - Validate and store profile images
//! - `GET /api/test/test` - Echo the authenticated identity
//! - `GET /api/objects?key=..` - Signed read URLs
//! - `DELETE /api/objects?key=..` - Delete an object
//! - `POST /api/test/send-otp` - Email a one-time code

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::multipart::collect_multipart;
use super::response::{messages, ApiResponse, AppError};
use crate::auth::{Identity, Otp};
use crate::mail::{otp_email_html, Mailer, OTP_SUBJECT};
use crate::storage::{BlobStore, ObjectStoreGateway, Owner, SignedUrl, StoredBatch};
use crate::validate::schemas::{OtpRequest, ProfileBody};
use crate::validate::{validate_body, validate_upload, MimePattern, UploadSpec, Violation};

/// Upload fields accepted by the profile image route.
pub const PROFILE_UPLOAD_FIELDS: [&str; 2] = ["licenseImages-R", "portfolioImages-R"];

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
pub struct AppState<B: BlobStore> {
    pub gateway: Arc<ObjectStoreGateway<B>>,

    /// None disables outbound email
    pub mailer: Option<Mailer>,

    /// Lifetime of one-time codes in minutes
    pub otp_minutes: u64,

    /// File constraints of the profile image route
    pub upload_specs: Arc<[UploadSpec]>,
}

impl<B: BlobStore> AppState<B> {
    pub fn new(gateway: ObjectStoreGateway<B>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            mailer: None,
            otp_minutes: 5,
            upload_specs: profile_upload_specs().into(),
        }
    }

    pub fn with_mailer(mut self, mailer: Option<Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_otp_minutes(mut self, minutes: u64) -> Self {
        self.otp_minutes = minutes;
        self
    }
}

impl<B: BlobStore> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            mailer: self.mailer.clone(),
            otp_minutes: self.otp_minutes,
            upload_specs: Arc::clone(&self.upload_specs),
        }
    }
}

/// Specs for [`PROFILE_UPLOAD_FIELDS`] with the image mime pattern.
pub fn profile_upload_specs() -> Vec<UploadSpec> {
    PROFILE_UPLOAD_FIELDS
        .iter()
        .filter_map(|decl| UploadSpec::parse(decl, MimePattern::images()).ok())
        .collect()
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Stored objects of one upload field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredField {
    pub original_keys: Vec<String>,
    pub thumbnail_keys: Vec<Option<String>>,
    pub urls: Vec<SignedUrl>,
    pub thumbnail_urls: Vec<SignedUrl>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> Response {
    let health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    ApiResponse::success("OK", json!(health)).into_response_with(StatusCode::OK)
}

/// Validate a multipart profile form and store its images.
///
/// File constraints are checked first, then the text fields (merged with the
/// query string) against [`ProfileBody`]. Nothing is stored unless both pass.
pub async fn image_upload_handler<B: BlobStore>(
    State(state): State<AppState<B>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(bad_request)?;
    let form = collect_multipart(multipart.map_err(bad_request)?).await?;

    let violations = validate_upload(&form.files, &state.upload_specs);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let profile: ProfileBody = validate_body(&form.payload(&query)).map_err(AppError::Validation)?;

    let owner = Owner::new(identity.role.clone(), identity.id.clone());
    let mut uploads = BTreeMap::new();

    for spec in state.upload_specs.iter() {
        let Some(files) = form.files.get(&spec.field) else {
            continue;
        };

        let batch = state.gateway.store_many(files, &spec.field, &owner).await?;
        uploads.insert(spec.field.clone(), describe_batch(&state.gateway, batch).await?);
    }

    info!(
        user_id = %identity.id,
        fields = uploads.len(),
        files = form.files.file_count(),
        "Profile images stored"
    );

    let body = json!({
        "firstName": profile.first_name,
        "lastName": profile.last_name,
        "uploads": uploads,
    });
    Ok(ApiResponse::success(messages::ADD, body).into_response_with(StatusCode::CREATED))
}

async fn describe_batch<B: BlobStore>(
    gateway: &ObjectStoreGateway<B>,
    batch: StoredBatch,
) -> Result<StoredField, AppError> {
    let urls = gateway.resolve_many(&batch.original_keys).await?;

    let mut thumbnail_urls = Vec::with_capacity(batch.thumbnail_keys.len());
    for key in &batch.thumbnail_keys {
        thumbnail_urls.push(gateway.resolve(key.as_deref()).await?);
    }

    Ok(StoredField {
        original_keys: batch.original_keys,
        thumbnail_keys: batch.thumbnail_keys,
        urls,
        thumbnail_urls,
    })
}

/// Echo the caller's identity.
pub async fn test_handler(Extension(identity): Extension<Identity>) -> Response {
    ApiResponse::success(messages::LIST_SUCCESS, json!(identity)).into_response_with(StatusCode::OK)
}

/// Signed URLs for every `key` query parameter, in order.
///
/// Without any `key` the body holds a single empty entry.
pub async fn resolve_objects_handler<B: BlobStore>(
    State(state): State<AppState<B>>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(bad_request)?;
    let keys: Vec<&str> = params
        .iter()
        .filter(|(name, _)| name == "key")
        .map(|(_, value)| value.as_str())
        .collect();

    let urls = if keys.is_empty() {
        vec![state.gateway.resolve(None).await?]
    } else {
        state.gateway.resolve_many(&keys).await?
    };

    Ok(ApiResponse::success(messages::LIST_SUCCESS, json!(urls)).into_response_with(StatusCode::OK))
}

/// Delete the object named by the `key` query parameter.
pub async fn delete_object_handler<B: BlobStore>(
    State(state): State<AppState<B>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(bad_request)?;
    let key = query.get("key").map(String::as_str).unwrap_or_default();
    if key.is_empty() {
        return Err(AppError::Validation(vec![Violation::for_field(
            "\"key\" is required",
            "key",
            None,
        )]));
    }

    let deleted = state.gateway.remove(key).await?;
    info!(user_id = %identity.id, key = key, "Object deleted");

    let body = json!({ "key": key, "deleted": deleted });
    Ok(ApiResponse::success(messages::DELETE_SUCCESS, body).into_response_with(StatusCode::OK))
}

/// Email a fresh one-time code. Delivery happens in the background.
pub async fn send_otp_handler<B: BlobStore>(
    State(state): State<AppState<B>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload.map_err(bad_request)?;
    let request: OtpRequest = validate_body(&payload).map_err(AppError::Validation)?;

    // Present after validation
    let email = request.email.unwrap_or_default();
    let otp = Otp::issue(state.otp_minutes).map_err(|e| AppError::Internal(e.to_string()))?;

    match &state.mailer {
        Some(mailer) => mailer.send_detached(
            email.clone(),
            OTP_SUBJECT.to_string(),
            otp_email_html(&otp.code, state.otp_minutes),
        ),
        None => warn!(to = %email, "Mail is not configured, OTP email skipped"),
    }

    let body = json!({ "email": email, "expiresAt": otp.expires_at });
    Ok(ApiResponse::success(messages::SEND_OTP_TO_EMAIL, body).into_response_with(StatusCode::OK))
}

/// Extractor rejections answer 400 inside the envelope.
fn bad_request(rejection: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(rejection.to_string())
}

/// Catch-all for unknown routes.
pub async fn fallback_handler() -> Response {
    ApiResponse::failure(messages::DATA_NOT_FOUND).into_response_with(StatusCode::NOT_FOUND)
}

// =============================================================================
// Tests
// =============================================================================
