// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error-to-response mapping tests.
//!
//! Internal failure detail must never reach the client; validation and
//! not-found messages must pass through verbatim.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use swapyard::error::AppError;

mod common;

async fn status_and_message(error: AppError) -> (StatusCode, String, bool) {
    let response = error.into_response();
    let status = response.status();

    let body = common::body_json(response).await;
    let message = body["message"].as_str().unwrap().to_string();
    let success = body["success"].as_bool().unwrap();

    (status, message, success)
}

#[tokio::test]
async fn test_validation_message_passes_through() {
    let (status, message, success) =
        status_and_message(AppError::Validation("Price must be a non-negative number".into()))
            .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Price must be a non-negative number");
    assert!(!success);
}

#[tokio::test]
async fn test_auth_errors_are_401() {
    for (error, expected) in [
        (AppError::Unauthorized, "Authentication required"),
        (AppError::InvalidCredentials, "Invalid email or password"),
        (AppError::IncorrectPassword, "Current password is incorrect"),
        (AppError::InvalidToken, "Invalid token"),
        (AppError::ExpiredToken, "Token has expired"),
    ] {
        let (status, message, _) = status_and_message(error).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, expected);
    }
}

#[tokio::test]
async fn test_ownership_and_lookup_errors() {
    let (status, message, _) =
        status_and_message(AppError::Forbidden("Not authorized to update this product".into()))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(message, "Not authorized to update this product");

    let (status, message, _) =
        status_and_message(AppError::NotFound("Product not found".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message, "Product not found");

    let (status, message, _) =
        status_and_message(AppError::Conflict("User already exists with this email".into())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(message, "User already exists with this email");
}

#[tokio::test]
async fn test_internal_detail_is_scrubbed() {
    // Upstream detail stays in the log; the client sees a fixed message
    let (status, message, _) = status_and_message(AppError::Upload(
        "host unreachable: http://images.internal:9000".into(),
    ))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "Failed to upload images");

    let (status, message, _) = status_and_message(AppError::Database(
        "firestore: permission denied for project p-123".into(),
    ))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "Database error");

    let (status, message, _) =
        status_and_message(AppError::Internal(anyhow::anyhow!("stack detail here"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "Internal server error");
}
