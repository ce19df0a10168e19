use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::token::{Identity, TokenVerifier};
use super::AuthError;

/// Verify the bearer token and attach the caller's [`Identity`] to the request.
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/objects", get(resolve_objects))
///     .layer(middleware::from_fn_with_state(verifier, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(verifier): State<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = verifier.verify_header(header)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Roles permitted on a route.
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[String]>);

impl AllowedRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn permits(&self, role: &str) -> bool {
        self.0.iter().any(|allowed| allowed == role)
    }
}

/// Reject callers whose role is not in `allowed`.
///
/// Must run after [`auth_middleware`]; a request without an identity is
/// treated as unauthenticated.
pub async fn authorize_role(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or(AuthError::MissingToken)?;

    if !allowed.permits(&identity.role) {
        warn!(
            user_id = %identity.id,
            role = %identity.role,
            path = %request.uri().path(),
            "Role not allowed"
        );
        return Err(AuthError::NotAuthorized);
    }

    Ok(next.run(request).await)
}
