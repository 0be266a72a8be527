// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-check enforcement and listing mutation tests.
//!
//! Update and delete are owner-only operations. These tests cover the
//! authorization boundary plus the image-merge rules on update and the
//! two-entity cleanup on delete.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

use common::MultipartForm;

const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0 not really a jpeg";

async fn put_product(
    app: &axum::Router,
    token: &str,
    product_id: Uuid,
    form: Vec<u8>,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/products/{product_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, MultipartForm::content_type())
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn delete_product(
    app: &axum::Router,
    token: &str,
    product_id: Uuid,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/products/{product_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn fetch_product(app: &axum::Router, product_id: Uuid) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/products/{product_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn product_images(app: &axum::Router, product_id: Uuid) -> Vec<String> {
    let response = fetch_product(app, product_id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    body["product"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// AUTHORIZATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_update_by_non_owner_forbidden() {
    let (app, _) = common::create_test_app();
    let (_, owner_token) = common::signup(&app, "Owner", "owner@example.com", "password1").await;
    let (_, other_token) = common::signup(&app, "Other", "other@example.com", "password1").await;
    let product_id = common::create_product(&app, &owner_token, "Couch").await;

    let form = MultipartForm::new().text("title", "Hijacked").finish();
    let response = put_product(&app, &other_token, product_id, form).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Not authorized to update this product");

    // Listing unchanged
    let response = fetch_product(&app, product_id).await;
    let body = common::body_json(response).await;
    assert_eq!(body["product"]["title"], "Couch");
}

#[tokio::test]
async fn test_delete_by_non_owner_forbidden() {
    let (app, _) = common::create_test_app();
    let (_, owner_token) = common::signup(&app, "Owner", "owner2@example.com", "password1").await;
    let (_, other_token) = common::signup(&app, "Other", "other2@example.com", "password1").await;
    let product_id = common::create_product(&app, &owner_token, "Desk").await;

    let response = delete_product(&app, &other_token, product_id).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(
        body["message"],
        "You don't have permission to delete this product"
    );

    // Still reachable
    let response = fetch_product(&app, product_id).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ═══════════════════════════════════════════════════════════════════════════
// UPDATE SEMANTICS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_update_partial_fields() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "partial@example.com", "password1").await;
    let product_id = common::create_product(&app, &token, "Bike").await;
    let images = product_images(&app, product_id).await;

    let form = MultipartForm::new()
        .text("title", "Bike (price drop)")
        .text("negotiable", "true")
        .text("existingImages", &json!(images).to_string())
        .finish();

    let response = put_product(&app, &token, product_id, form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Product updated successfully");

    let product = &body["product"];
    assert_eq!(product["title"], "Bike (price drop)");
    assert_eq!(product["negotiable"], true);
    // Untouched fields keep their values
    assert_eq!(product["price"], 25.0);
    assert_eq!(product["category"], "electronics");
    assert_eq!(product["images"].as_array().unwrap().len(), images.len());
}

#[tokio::test]
async fn test_update_merges_and_truncates_images() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "merge@example.com", "password1").await;

    // Listing with two images
    let form = MultipartForm::new()
        .text("title", "Camera")
        .text("price", "90")
        .text("category", "electronics")
        .file("images", "front.jpg", "image/jpeg", JPEG_BYTES)
        .file("images", "back.jpg", "image/jpeg", JPEG_BYTES)
        .finish();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-product")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, MultipartForm::content_type())
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    let product_id: Uuid = body["product"]["id"].as_str().unwrap().parse().unwrap();
    let images = product_images(&app, product_id).await;
    let retained = images[0].clone();

    // Keep the first image, add four new ones: union of five truncates to four
    let mut form = MultipartForm::new().text("existingImages", &json!([retained]).to_string());
    for i in 0..4 {
        form = form.file("images", &format!("new{i}.jpg"), "image/jpeg", JPEG_BYTES);
    }

    let response = put_product(&app, &token, product_id, form.finish()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    let merged: Vec<&str> = body["product"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();

    assert_eq!(merged.len(), 4);
    assert_eq!(merged[0], retained, "retained image stays first");
    assert!(
        !merged.contains(&images[1].as_str()),
        "dropped image must not reappear"
    );
}

#[tokio::test]
async fn test_update_clears_optional_fields() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "clear@example.com", "password1").await;

    let form = MultipartForm::new()
        .text("title", "Table")
        .text("price", "40")
        .text("category", "furniture")
        .text("description", "Solid oak")
        .text("location", "Menlo Park")
        .file("images", "a.jpg", "image/jpeg", JPEG_BYTES)
        .finish();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-product")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, MultipartForm::content_type())
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = common::body_json(response).await;
    let product_id: Uuid = body["product"]["id"].as_str().unwrap().parse().unwrap();
    let images = product_images(&app, product_id).await;

    // Blank description clears it; location is not mentioned and survives
    let form = MultipartForm::new()
        .text("description", "   ")
        .text("existingImages", &json!(images).to_string())
        .finish();

    let response = put_product(&app, &token, product_id, form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert!(body["product"]["description"].is_null());
    assert_eq!(body["product"]["location"], "Menlo Park");
}

#[tokio::test]
async fn test_update_rejects_malformed_existing_images() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "badjson@example.com", "password1").await;
    let product_id = common::create_product(&app, &token, "Router").await;

    let form = MultipartForm::new()
        .text("existingImages", "not json at all")
        .finish();

    let response = put_product(&app, &token, product_id, form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(
        body["message"],
        "existingImages must be a JSON array of image URLs"
    );
}

#[tokio::test]
async fn test_update_rejects_empty_image_union() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "noimg@example.com", "password1").await;
    let product_id = common::create_product(&app, &token, "Monitor").await;

    // Client keeps nothing and uploads nothing
    let form = MultipartForm::new().text("existingImages", "[]").finish();

    let response = put_product(&app, &token, product_id, form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "At least one image is required");
}

#[tokio::test]
async fn test_update_missing_product_is_404() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "upd404@example.com", "password1").await;

    let form = MultipartForm::new().text("title", "Ghost").finish();
    let response = put_product(&app, &token, Uuid::new_v4(), form).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// DELETE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_delete_removes_product_and_back_reference() {
    let (app, _) = common::create_test_app();
    let (user_id, token) = common::signup(&app, "Owner", "del@example.com", "password1").await;
    let product_id = common::create_product(&app, &token, "Freezer").await;

    // Client maintains the back-reference after create
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{user_id}/add-product"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "productId": product_id }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert!(body["user"]["products"]
        .as_array()
        .unwrap()
        .contains(&json!(product_id)));

    // Delete and verify both sides
    let response = delete_product(&app, &token, product_id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Product deleted successfully");

    let response = fetch_product(&app, product_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/users/{user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["user"]["products"], json!([]));
}

#[tokio::test]
async fn test_delete_missing_product_is_404() {
    let (app, _) = common::create_test_app();
    let (_, token) = common::signup(&app, "Owner", "del404@example.com", "password1").await;

    let response = delete_product(&app, &token, Uuid::new_v4()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Product not found");
}
