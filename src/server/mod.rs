//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                                                                 │
//! │  ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌───────────────┐   │
//! │  │  routes  │  │ handlers  │  │ multipart│  │   response    │   │
//! │  │ (layers) │  │ (state)   │  │ (collect)│  │ (envelope)    │   │
//! │  └──────────┘  └───────────┘  └──────────┘  └───────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod multipart;
pub mod response;
pub mod routes;

pub use handlers::{
    fallback_handler, health_handler, profile_upload_specs, AppState, HealthResponse, StoredField,
    PROFILE_UPLOAD_FIELDS,
};
pub use multipart::{collect_multipart, MultipartForm};
pub use response::{messages, ApiResponse, AppError};
pub use routes::{create_router, RouterConfig, ADMIN_ROLE, DEFAULT_BODY_LIMIT};
