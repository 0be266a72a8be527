// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public profiles and the user-side product back-reference.

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    middleware,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use super::json_body;
use crate::error::{AppError, Result};
use crate::middleware::require_auth;
use crate::models::PublicUser;
use crate::AppState;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let auth = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/users/{user_id}", get(get_user_by_id))
        .route(
            "/{user_id}/add-product",
            patch(add_product_to_user).route_layer(auth),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AddProductRequest {
    product_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfileResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AddProductResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

/// Public profile lookup. No session required.
async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfileResponse>> {
    let user_id: Uuid = user_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID format".to_string()))?;

    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfileResponse {
        success: true,
        user: user.into(),
    }))
}

/// Append a product id to a user's products list.
///
/// The list is append-only: duplicates are kept, and the product id is not
/// checked for existence. Clients call this right after creating a listing
/// to maintain the back-reference.
async fn add_product_to_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    body: std::result::Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<Json<AddProductResponse>> {
    let body = json_body(body)?;

    let user_id: Uuid = user_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID or product ID".to_string()))?;
    let product_id: Uuid = body
        .product_id
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID or product ID".to_string()))?;

    let user = state
        .db
        .push_user_product(user_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user_id, product_id = %product_id, "Product added to user");

    Ok(Json(AddProductResponse {
        success: true,
        message: "Product added to user successfully".to_string(),
        user: user.into(),
    }))
}
