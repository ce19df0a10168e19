//! Object resolution, deletion and OTP route integration tests.
//!
//! Tests verify:
//! - Signed URLs come back in request order with the fixed expiry
//! - Deletes are admin-only and idempotent
//! - OTP requests are validated before anything is sent

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use media_gateway::{AppState, ObjectStoreGateway};

use super::test_utils::{
    admin_token, bearer, body_json, router_with_state, test_router, token_for,
    violation_messages, MemoryBlobStore, TEST_BUCKET,
};

fn objects_request(method: &str, query: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(format!("/api/objects{}", query))
        .header(header::AUTHORIZATION, bearer(token))
        .body(Body::empty())
        .unwrap()
}

fn otp_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/test/send-otp")
        .header(header::AUTHORIZATION, bearer(&token_for("p-9", "provider")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Resolve
// =============================================================================

#[tokio::test]
async fn test_resolve_without_key_returns_empty_entry() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(objects_request("GET", "", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["body"], serde_json::json!([{ "key": "", "url": "" }]));
}

#[tokio::test]
async fn test_resolve_keeps_request_order() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(objects_request(
            "GET",
            "?key=provider/1/b.png&key=provider/1/a.png",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let urls = json["body"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0]["key"], "provider/1/b.png");
    assert_eq!(urls[1]["key"], "provider/1/a.png");
    assert_eq!(
        urls[0]["url"],
        format!("https://memory.test/{}/provider/1/b.png?X-Amz-Expires=21600", TEST_BUCKET)
    );
}

#[tokio::test]
async fn test_resolve_open_to_any_role() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(objects_request("GET", "?key=a.png", &token_for("p-1", "provider")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resolve_requires_token() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/objects?key=a.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = MemoryBlobStore::new();
    store.insert("admin/1/doc/_doc-1-x.png", vec![1, 2, 3], "image/png").await;
    let router = test_router(store.clone());

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(objects_request(
                "DELETE",
                "?key=admin/1/doc/_doc-1-x.png",
                &admin_token(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Data deleted successfully");
        assert_eq!(json["body"]["deleted"], true);
    }

    assert_eq!(store.delete_count(), 2);
    assert_eq!(store.object_count().await, 0);
}

#[tokio::test]
async fn test_delete_without_key_rejected() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let response = router
        .oneshot(objects_request("DELETE", "", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        violation_messages(&body_json(response).await),
        vec!["\"key\" is required"]
    );
    assert_eq!(store.delete_count(), 0);
}

#[tokio::test]
async fn test_delete_requires_admin() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let response = router
        .oneshot(objects_request("DELETE", "?key=a.png", &token_for("p-1", "provider")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Not authorized for this API route"
    );
    assert_eq!(store.delete_count(), 0);
}

// =============================================================================
// OTP
// =============================================================================

#[tokio::test]
async fn test_send_otp_accepts_valid_email() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(otp_request(r#"{"email":"ada@example.com"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "OTP has been sent successfully to registered email address."
    );
    assert_eq!(json["body"]["email"], "ada@example.com");
    assert!(json["body"]["expiresAt"].is_string());
    assert!(json["body"].get("code").is_none());
}

#[tokio::test]
async fn test_send_otp_rejects_invalid_email() {
    let router = test_router(MemoryBlobStore::new());

    let response = router
        .oneshot(otp_request(r#"{"email":"not-an-email"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        violation_messages(&body_json(response).await),
        vec!["\"email\" must be a valid email"]
    );
}

#[tokio::test]
async fn test_send_otp_rejects_missing_email() {
    let router = test_router(MemoryBlobStore::new());

    let response = router.oneshot(otp_request("{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        violation_messages(&body_json(response).await),
        vec!["\"email\" is required"]
    );
}

#[tokio::test]
async fn test_send_otp_rejects_malformed_json() {
    let router = test_router(MemoryBlobStore::new());

    let response = router.oneshot(otp_request("{email:")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], false);
}

#[tokio::test]
async fn test_send_otp_out_of_range_lifetime_is_500() {
    let state =
        AppState::new(ObjectStoreGateway::new(MemoryBlobStore::new())).with_otp_minutes(1 << 60);
    let router = router_with_state(state);

    let response = router
        .oneshot(otp_request(r#"{"email":"ada@example.com"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "Internal Server Error");
}
