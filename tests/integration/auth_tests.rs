//! Authentication integration tests.
//!
//! Tests verify:
//! - Valid tokens reach the handler with their identity
//! - Expired and malformed tokens get distinct messages
//! - Missing headers and non-bearer schemes are rejected
//! - Role checks on admin routes

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use media_gateway::TokenIssuer;
use media_gateway::Identity;

use super::test_utils::{
    admin_token, bearer, body_json, expired_token, test_router, token_for, MemoryBlobStore,
};

fn echo_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/test/test");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

// =============================================================================
// Valid Tokens
// =============================================================================

#[tokio::test]
async fn test_valid_admin_token_echoes_identity() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(echo_request(Some(&bearer(&admin_token()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], true);
    assert_eq!(json["body"]["id"], "admin-1");
    assert_eq!(json["body"]["role"], "admin");
}

#[tokio::test]
async fn test_extra_claims_are_kept() {
    let router = test_router(MemoryBlobStore::new());

    let mut identity = Identity::new("admin-2", "admin");
    identity
        .extra
        .insert("email".to_string(), serde_json::json!("root@example.com"));
    let token = TokenIssuer::new(super::test_utils::TEST_SECRET, 5)
        .issue(&identity)
        .unwrap();

    let response = router.oneshot(echo_request(Some(&bearer(&token)))).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["body"]["email"], "root@example.com");
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_missing_header_rejected() {
    let router = test_router(MemoryBlobStore::new());

    let response = router.oneshot(echo_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "Auth Error: Authorization Token Required");
    assert!(json["body"].is_null());
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(echo_request(Some(&format!("Basic {}", admin_token()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Auth Error: Authorization Token Required"
    );
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(echo_request(Some(&bearer(&expired_token("admin")))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Token Expire");
}

#[tokio::test]
async fn test_malformed_token_rejected() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(echo_request(Some("Bearer definitely.not.valid")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid Token");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let router = test_router(MemoryBlobStore::new());
    let token = TokenIssuer::new("another-secret", 5)
        .issue(&Identity::new("x", "admin"))
        .unwrap();

    let response = router.oneshot(echo_request(Some(&bearer(&token)))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid Token");
}

#[tokio::test]
async fn test_wrong_role_rejected() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(echo_request(Some(&bearer(&token_for("u-7", "provider")))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Not authorized for this API route"
    );
}

#[tokio::test]
async fn test_expired_beats_role_check() {
    // Verification runs before the role check
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(echo_request(Some(&bearer(&expired_token("provider")))))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["message"], "Token Expire");
}

// =============================================================================
// Public Routes
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["body"]["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route_returns_404_envelope() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "No data found");
}
