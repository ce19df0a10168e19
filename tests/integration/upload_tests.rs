//! Upload pipeline integration tests.
//!
//! Tests verify:
//! - Required fields, mime types and sizes are checked before storage
//! - Body schema violations are reported with their field context
//! - Accepted uploads store originals and thumbnails under owner-scoped keys
//! - Signed URLs are returned for every stored object

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use media_gateway::validate::MAX_UPLOAD_BYTES;
use media_gateway::ThumbnailFailurePolicy;

use super::test_utils::{
    admin_token, bearer, body_json, create_jpeg, create_png, is_valid_jpeg, is_valid_png,
    test_router, test_router_with_policy, upload_request, upload_request_with_query,
    valid_profile_form, violation_messages, MemoryBlobStore, MultipartBuilder,
};

// =============================================================================
// File Validation
// =============================================================================

#[tokio::test]
async fn test_missing_required_field_rejected_without_storage() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("portfolioImages", "a.png", "image/png", &create_png(10, 10));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Validation error");
    assert_eq!(violation_messages(&json), vec!["licenseImages is required"]);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_no_files_reports_every_required_field() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let form = MultipartBuilder::new().text("firstName", "Ada");
    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(
        violation_messages(&json),
        vec!["licenseImages is required", "portfolioImages is required"]
    );
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_disallowed_mime_type_rejected() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    // Oversized as well: only the mime error is reported
    let big_pdf = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("licenseImages", "scan.pdf", "application/pdf", &big_pdf)
        .file("portfolioImages", "a.png", "image/png", &create_png(10, 10));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(
        violation_messages(&json),
        vec!["licenseImages allowed only jpeg, jpg, png, heic mime type"]
    );
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let big = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("licenseImages", "huge.png", "image/png", &big)
        .file("portfolioImages", "a.png", "image/png", &create_png(10, 10));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(
        violation_messages(&json),
        vec!["licenseImages file size should not be greater than 5MB for huge.png"]
    );
}

#[tokio::test]
async fn test_repeated_mime_errors_reported_once() {
    let router = test_router(MemoryBlobStore::new());

    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("licenseImages", "a.png", "image/png", &create_png(10, 10))
        .file("portfolioImages", "a.gif", "image/gif", b"GIF89a")
        .file("portfolioImages", "b.gif", "image/gif", b"GIF89a");

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(
        violation_messages(&json),
        vec!["portfolioImages allowed only jpeg, jpg, png, heic mime type"]
    );
}

// =============================================================================
// Body Validation
// =============================================================================

#[tokio::test]
async fn test_missing_first_name_rejected() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let form = MultipartBuilder::new()
        .file("licenseImages", "a.png", "image/png", &create_png(10, 10))
        .file("portfolioImages", "b.png", "image/png", &create_png(10, 10));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["error"][0]["messages"], "\"firstName\" is required");
    assert_eq!(json["error"][0]["context"]["key"], "firstName");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_query_parameters_count_as_fields() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let form = MultipartBuilder::new()
        .file("licenseImages", "a.png", "image/png", &create_png(32, 32))
        .file("portfolioImages", "b.png", "image/png", &create_png(32, 32));

    let response = router
        .oneshot(upload_request_with_query(
            Some(&admin_token()),
            form,
            "?firstName=Grace",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["body"]["firstName"], "Grace");
}

#[tokio::test]
async fn test_non_multipart_body_rejected_in_envelope() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/test/image-upload")
        .header(header::AUTHORIZATION, bearer(&admin_token()))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"firstName":"Ada"}"#))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["status"], false);
    assert!(json["body"].is_null());
    assert!(!json["message"].as_str().unwrap().is_empty());
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_empty_first_name_names_payload_key() {
    let router = test_router(MemoryBlobStore::new());

    let form = MultipartBuilder::new()
        .text("firstName", "")
        .file("licenseImages", "a.png", "image/png", &create_png(10, 10))
        .file("portfolioImages", "b.png", "image/png", &create_png(10, 10));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["error"][0]["messages"], "\"firstName\" is not allowed to be empty");
    assert_eq!(json["error"][0]["context"]["key"], "firstName");
}

// =============================================================================
// Unprocessable Images
// =============================================================================

#[cfg(not(feature = "heic"))]
#[tokio::test]
async fn test_heic_rejected_without_decoder() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("licenseImages", "photo.heic", "image/heic", b"\0\0\0\x18ftypheic")
        .file("portfolioImages", "b.png", "image/png", &create_png(10, 10));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["status"], false);
    assert_eq!(json["message"], "Uploaded image could not be processed");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_fail_policy_rejects_undecodable_image() {
    let store = MemoryBlobStore::new();
    let router = test_router_with_policy(store.clone(), ThumbnailFailurePolicy::Fail);

    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("licenseImages", "a.png", "image/png", b"not really a png")
        .file("portfolioImages", "b.jpg", "image/jpeg", &create_jpeg(64, 64));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Uploaded image could not be processed"
    );

    // The original went up before its thumbnail failed; nothing is rolled back
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_fail_policy_accepts_decodable_images() {
    let store = MemoryBlobStore::new();
    let router = test_router_with_policy(store.clone(), ThumbnailFailurePolicy::Fail);

    let response = router
        .oneshot(upload_request(Some(&admin_token()), valid_profile_form()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.put_count(), 6);
}

// =============================================================================
// Successful Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_stores_originals_and_thumbnails() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let response = router
        .oneshot(upload_request(Some(&admin_token()), valid_profile_form()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["status"], true);
    assert_eq!(json["message"], "Data Add successfully");
    assert_eq!(json["body"]["firstName"], "Ada");

    // 3 originals + 3 thumbnails
    assert_eq!(store.put_count(), 6);
    assert_eq!(store.object_count().await, 6);

    let license = &json["body"]["uploads"]["licenseImages"];
    let key = license["originalKeys"][0].as_str().unwrap();
    assert!(key.starts_with("admin/admin-1/licenseImages/_licenseImages-"));
    assert!(key.ends_with(".png"));

    let (data, content_type) = store.get(key).await.unwrap();
    assert!(is_valid_png(&data));
    assert_eq!(content_type, "image/png");

    let thumb_key = license["thumbnailKeys"][0].as_str().unwrap();
    assert!(thumb_key.starts_with("admin/admin-1/licenseImages-thumbnail/_licenseImages-thumbnail-"));
    let (thumb, _) = store.get(thumb_key).await.unwrap();
    let decoded = image::load_from_memory(&thumb).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
}

#[tokio::test]
async fn test_upload_keeps_input_order_and_signs_urls() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let response = router
        .oneshot(upload_request(Some(&admin_token()), valid_profile_form()))
        .await
        .unwrap();
    let json = body_json(response).await;

    let portfolio = &json["body"]["uploads"]["portfolioImages"];
    let keys = portfolio["originalKeys"].as_array().unwrap();
    assert_eq!(keys.len(), 2);

    // Second portfolio image is the portrait one
    let (second, _) = store.get(keys[1].as_str().unwrap()).await.unwrap();
    let decoded = image::load_from_memory(&second).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 900));

    for (i, url) in portfolio["urls"].as_array().unwrap().iter().enumerate() {
        assert_eq!(url["key"], keys[i]);
        assert!(url["url"].as_str().unwrap().contains("X-Amz-Expires=21600"));
    }

    let thumb_url = &portfolio["thumbnailUrls"][0];
    let thumb_key = thumb_url["key"].as_str().unwrap();
    let (thumb, content_type) = store.get(thumb_key).await.unwrap();
    assert!(is_valid_jpeg(&thumb));
    assert_eq!(content_type, "image/jpeg");
}

#[tokio::test]
async fn test_corrupt_image_skips_thumbnail() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let form = MultipartBuilder::new()
        .text("firstName", "Ada")
        .file("licenseImages", "a.png", "image/png", b"not really a png")
        .file("portfolioImages", "b.jpg", "image/jpeg", &create_jpeg(64, 64));

    let response = router
        .oneshot(upload_request(Some(&admin_token()), form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let license = &json["body"]["uploads"]["licenseImages"];
    assert!(license["thumbnailKeys"][0].is_null());
    assert_eq!(license["thumbnailUrls"][0]["url"], "");

    // 2 originals + 1 thumbnail
    assert_eq!(store.put_count(), 3);
}

#[tokio::test]
async fn test_upload_requires_admin() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let token = super::test_utils::token_for("p-1", "provider");
    let response = router
        .oneshot(upload_request(Some(&token), valid_profile_form()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_without_token_rejected() {
    let store = MemoryBlobStore::new();
    let router = test_router(store.clone());

    let response = router
        .oneshot(upload_request(None, valid_profile_form()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.put_count(), 0);
}
