//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /health                    GET     public
//! /api/test/image-upload     POST    bearer + admin
//! /api/test/test             GET     bearer + admin
//! /api/test/send-otp         POST    bearer
//! /api/objects               GET     bearer
//! /api/objects               DELETE  bearer + admin
//! anything else              404 envelope
//! ```
//!
//! # Example
//!
//! ```ignore
//! let gateway = ObjectStoreGateway::new(S3BlobStore::new(client, "uploads"));
//! let state = AppState::new(gateway);
//! let router = create_router(state, RouterConfig::new("jwt-secret"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_object_handler, fallback_handler, health_handler, image_upload_handler,
    resolve_objects_handler, send_otp_handler, test_handler, AppState,
};
use crate::auth::{auth_middleware, authorize_role, AllowedRoles, TokenVerifier};
use crate::storage::BlobStore;

/// Largest accepted request body (50 MB).
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Role allowed on administrative routes.
pub const ADMIN_ROLE: &str = "admin";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum request body size in bytes
    pub body_limit: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Any CORS origin, 50 MB bodies, tracing on.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            cors_origins: None,
            body_limit: DEFAULT_BODY_LIMIT,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router<B: BlobStore>(state: AppState<B>, config: RouterConfig) -> Router {
    let verifier = TokenVerifier::new(&config.jwt_secret);
    let admin_only = middleware::from_fn_with_state(AllowedRoles::new([ADMIN_ROLE]), authorize_role);

    let admin_routes = Router::new()
        .route("/api/test/image-upload", post(image_upload_handler::<B>))
        .route("/api/test/test", get(test_handler))
        .route_layer(admin_only.clone());

    // Reading is open to any caller, deleting is not
    let objects = get(resolve_objects_handler::<B>)
        .merge(delete(delete_object_handler::<B>).route_layer(admin_only));

    // route_layer keeps unknown paths out of auth so they reach the fallback
    let protected_routes = Router::new()
        .route("/api/objects", objects)
        .route("/api/test/send-otp", post(send_otp_handler::<B>))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(verifier, auth_middleware))
        .with_state(state);

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(protected_routes)
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
