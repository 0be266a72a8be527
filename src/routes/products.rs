// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product listing lifecycle: create, browse, update, delete.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use super::require_field;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::require_auth;
use crate::models::{Condition, Product};
use crate::services::images::{self, StagedImage};
use crate::time_utils::now_rfc3339;
use crate::AppState;

/// Hard cap on images per listing.
const MAX_IMAGES: usize = 4;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let auth = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/add-product", post(create_product).route_layer(auth.clone()))
        .route("/get-products", get(list_products))
        .route(
            "/products/user",
            get(list_own_products).route_layer(auth.clone()),
        )
        .route("/products/{product_id}", get(get_product))
        .route(
            "/products/{product_id}",
            put(update_product).delete(delete_product).route_layer(auth),
        )
        // Multipart bodies carry up to four images
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

// ─── Response bodies ─────────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProductResponse {
    pub success: bool,
    pub message: String,
    pub product: Product,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteProductResponse {
    pub success: bool,
    pub message: String,
}

// ─── Multipart helpers ───────────────────────────────────────────────────────

/// Drain a multipart body into text fields and staged image files.
///
/// Parts named `images` are written to the staging directory; everything
/// else is collected as text. If reading fails partway, the files staged so
/// far are purged before the error propagates.
async fn read_multipart(
    staging_dir: &str,
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Vec<StagedImage>)> {
    let mut fields = HashMap::new();
    let mut staged = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                images::purge_staged(&staged).await;
                return Err(AppError::Validation(format!(
                    "Malformed multipart body: {e}"
                )));
            }
        };

        let name = field.name().unwrap_or_default().to_string();

        if name == "images" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(|ct| ct.to_string());
            let data = match field.bytes().await {
                Ok(data) => data,
                Err(e) => {
                    images::purge_staged(&staged).await;
                    return Err(AppError::Validation(format!(
                        "Malformed multipart body: {e}"
                    )));
                }
            };

            match images::stage_file(staging_dir, &file_name, content_type, &data).await {
                Ok(image) => staged.push(image),
                Err(e) => {
                    images::purge_staged(&staged).await;
                    return Err(e);
                }
            }
        } else {
            match field.text().await {
                Ok(value) => {
                    fields.insert(name, value);
                }
                Err(e) => {
                    images::purge_staged(&staged).await;
                    return Err(AppError::Validation(format!(
                        "Malformed multipart body: {e}"
                    )));
                }
            }
        }
    }

    Ok((fields, staged))
}

/// Parse the `condition` field, defaulting when absent or blank.
fn parse_condition(value: Option<&str>) -> Result<Condition> {
    match value.map(str::trim) {
        None | Some("") => Ok(Condition::default()),
        Some("new") => Ok(Condition::New),
        Some("used") => Ok(Condition::Used),
        Some(_) => Err(AppError::Validation(
            "Condition must be 'new' or 'used'".to_string(),
        )),
    }
}

/// Permissive boolean coercion: exactly the string "true" switches it on,
/// anything else is false.
fn parse_negotiable(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true"))
}

/// Parse the `price` field as a finite non-negative number.
fn parse_price(value: &str) -> Result<f64> {
    let price: f64 = value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("Price must be a non-negative number".to_string()))?;

    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }

    Ok(price)
}

/// Optional text field: blank collapses to None.
fn blank_to_none(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_product_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid product ID format".to_string()))
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// Create a listing from a multipart form.
///
/// Staged files are purged on every exit path once the upload attempts have
/// finished, success included.
async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let (fields, staged) = read_multipart(&state.config.upload_staging_dir, multipart).await?;

    let result = create_product_inner(&state, user, &fields, &staged).await;
    images::purge_staged(&staged).await;
    result
}

async fn create_product_inner(
    state: &Arc<AppState>,
    user: AuthUser,
    fields: &HashMap<String, String>,
    staged: &[StagedImage],
) -> Result<(StatusCode, Json<ProductResponse>)> {
    // Count validation comes first: an over-limit request is rejected before
    // any upload, not truncated.
    if staged.is_empty() {
        return Err(AppError::Validation(
            "At least one image is required".to_string(),
        ));
    }
    if staged.len() > MAX_IMAGES {
        return Err(AppError::Validation("Maximum 4 images allowed".to_string()));
    }

    let title = require_field(
        fields.get("title").map(String::as_str),
        "Title, price and category are required",
    )?
    .trim();
    let price = require_field(
        fields.get("price").map(String::as_str),
        "Title, price and category are required",
    )?;
    let category = require_field(
        fields.get("category").map(String::as_str),
        "Title, price and category are required",
    )?
    .trim();

    let price = parse_price(price)?;
    let condition = parse_condition(fields.get("condition").map(String::as_str))?;
    let negotiable = parse_negotiable(fields.get("negotiable").map(String::as_str));

    // Uploads run in parallel; the listing proceeds with whichever subset
    // succeeded and only fails when nothing survived.
    let image_urls = images::successful_uploads(state.images.upload_all(staged).await);
    if image_urls.is_empty() {
        return Err(AppError::Upload("every image upload failed".to_string()));
    }

    let now = now_rfc3339();
    let product = Product {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: blank_to_none(fields.get("description")),
        price,
        category: category.to_string(),
        location: blank_to_none(fields.get("location")),
        condition,
        negotiable,
        images: image_urls,
        owner_id: user.user_id,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_product(&product).await?;

    tracing::info!(
        product_id = %product.id,
        user_id = %user.user_id,
        images = product.images.len(),
        "Product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: "Product created successfully".to_string(),
            product,
        }),
    ))
}

/// Unfiltered listing feed. No pagination.
async fn list_products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>> {
    let products = state.db.list_products().await?;
    Ok(Json(products))
}

/// The caller's own listings, newest first.
async fn list_own_products(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProductListResponse>> {
    let products = state.db.products_by_owner(user.user_id).await?;

    Ok(Json(ProductListResponse {
        success: true,
        products,
        message: "User products fetched successfully".to_string(),
    }))
}

/// Fetch a single listing. No session required.
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product_id = parse_product_id(&product_id)?;

    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductResponse {
        success: true,
        message: "Product fetched successfully".to_string(),
        product,
    }))
}

/// Owner-only partial update.
///
/// The final image set is the client's retained `existingImages` list plus
/// whatever new uploads succeeded, truncated to the cap. A failed new upload
/// is dropped rather than failing the whole update.
async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    let product_id = parse_product_id(&product_id)?;

    let (fields, staged) = read_multipart(&state.config.upload_staging_dir, multipart).await?;

    let result = update_product_inner(&state, user, product_id, &fields, &staged).await;
    images::purge_staged(&staged).await;
    result
}

async fn update_product_inner(
    state: &Arc<AppState>,
    user: AuthUser,
    product_id: Uuid,
    fields: &HashMap<String, String>,
    staged: &[StagedImage],
) -> Result<Json<ProductResponse>> {
    let mut product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if product.owner_id != user.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this product".to_string(),
        ));
    }

    // Scalar fields are replace-if-present. Title, category, price, and
    // condition treat blank as "leave unchanged"; description and location
    // treat blank as "clear".
    if let Some(title) = fields.get("title") {
        if !title.trim().is_empty() {
            product.title = title.trim().to_string();
        }
    }
    if let Some(category) = fields.get("category") {
        if !category.trim().is_empty() {
            product.category = category.trim().to_string();
        }
    }
    if let Some(price) = fields.get("price") {
        if !price.trim().is_empty() {
            product.price = parse_price(price)?;
        }
    }
    if let Some(condition) = fields.get("condition") {
        if !condition.trim().is_empty() {
            product.condition = parse_condition(Some(condition.as_str()))?;
        }
    }
    if fields.contains_key("negotiable") {
        product.negotiable = parse_negotiable(fields.get("negotiable").map(String::as_str));
    }
    if fields.contains_key("description") {
        product.description = blank_to_none(fields.get("description"));
    }
    if fields.contains_key("location") {
        product.location = blank_to_none(fields.get("location"));
    }

    let retained = match fields.get("existingImages") {
        Some(raw) => serde_json::from_str::<Vec<String>>(raw).map_err(|_| {
            AppError::Validation("existingImages must be a JSON array of image URLs".to_string())
        })?,
        None => Vec::new(),
    };

    let uploaded = images::successful_uploads(state.images.upload_all(staged).await);

    let mut merged = retained;
    merged.extend(uploaded);
    merged.truncate(MAX_IMAGES);

    if merged.is_empty() {
        return Err(AppError::Validation(
            "At least one image is required".to_string(),
        ));
    }

    product.images = merged;
    product.updated_at = now_rfc3339();

    state.db.upsert_product(&product).await?;

    tracing::info!(
        product_id = %product.id,
        user_id = %user.user_id,
        images = product.images.len(),
        "Product updated"
    );

    Ok(Json(ProductResponse {
        success: true,
        message: "Product updated successfully".to_string(),
        product,
    }))
}

/// Owner-only delete. Removes the record, then pulls the id from the
/// owner's products list.
///
/// The two writes are not transactional: if the second fails, the id stays
/// in the owner's list while the product itself is already gone.
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> Result<Json<DeleteProductResponse>> {
    let product_id = parse_product_id(&product_id)?;

    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if product.owner_id != user.user_id {
        return Err(AppError::Forbidden(
            "You don't have permission to delete this product".to_string(),
        ));
    }

    state.db.delete_product(product_id).await?;
    state.db.pull_user_product(user.user_id, product_id).await?;

    tracing::info!(
        product_id = %product_id,
        user_id = %user.user_id,
        "Product deleted"
    );

    Ok(Json(DeleteProductResponse {
        success: true,
        message: "Product deleted successfully".to_string(),
    }))
}
