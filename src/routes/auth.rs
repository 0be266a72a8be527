// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login, and session management.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use super::{json_body, require_field};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, AUTH_COOKIE};
use crate::middleware::require_auth;
use crate::models::{PublicUser, Role, User};
use crate::services::password::{hash_password, verify_password};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let auth = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout).route_layer(auth.clone()))
        .route("/get-user", get(get_current_user).route_layer(auth.clone()))
        .route("/reset-password", post(reset_password).route_layer(auth))
}

// ─── Session cookie ──────────────────────────────────────────────────────────

/// Session cookie carrying the JWT.
///
/// `Secure` follows the frontend scheme so local HTTP development still
/// receives the cookie.
fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(config.jwt_ttl_seconds))
        .build()
}

/// Zero-lifetime cookie that removes the session from the browser.
fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

// ─── Request / response bodies ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SignupRequest {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    password: Option<String>,
    role: Option<Role>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ResetPasswordRequest {
    current_password: Option<String>,
    new_password: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentUserResponse {
    pub user: PublicUser,
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub message: String,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// Register a new account.
///
/// Emails are stored lowercased so lookups are case-insensitive. New users
/// always start with an empty products list; there is no way to seed one
/// through this endpoint.
async fn signup(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let body = json_body(body)?;

    let name = require_field(body.name.as_deref(), "All required fields are mandatory")?.trim();
    let email = require_field(body.email.as_deref(), "All required fields are mandatory")?;
    let phone = require_field(body.phone.as_deref(), "All required fields are mandatory")?.trim();
    let password = require_field(body.password.as_deref(), "All required fields are mandatory")?;

    let email = email.trim().to_lowercase();

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;

    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        phone: phone.to_string(),
        role: body.role.unwrap_or_default(),
        password_hash,
        products: Vec::new(),
        created_at: now_rfc3339(),
    };

    state.db.upsert_user(&user).await?;

    let token = create_jwt(
        user.id,
        &state.config.jwt_signing_key,
        state.config.jwt_ttl_seconds,
    )?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Log in with email and password, establishing the session cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let body = json_body(body)?;

    let email = require_field(body.email.as_deref(), "Email and password are required")?;
    let password = require_field(body.password.as_deref(), "Email and password are required")?;

    let email = email.trim().to_lowercase();

    // Unknown email and wrong password produce the same response, so the
    // endpoint cannot be used to enumerate accounts.
    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(
        user.id,
        &state.config.jwt_signing_key,
        state.config.jwt_ttl_seconds,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar.add(session_cookie(token.clone(), &state.config));

    Ok((
        jar,
        Json(LoginResponse {
            message: "User Login successful".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// Clear the session cookie.
///
/// Logout is stateless: the token itself stays valid until expiry, only the
/// browser's copy is removed.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    tracing::info!(user_id = %user.user_id, "User logged out");

    let jar = jar.add(removal_cookie(&state.config));

    (
        jar,
        Json(LogoutResponse {
            message: "User logged out successfully".to_string(),
        }),
    )
}

/// Fetch the caller's profile.
///
/// Re-reads the user document rather than echoing token claims, so deleted
/// accounts get a 404 even with a live token.
async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CurrentUserResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(CurrentUserResponse {
        user: profile.into(),
        message: "Current User Fetched Successfully".to_string(),
    }))
}

/// Change the caller's password after re-verifying the current one.
async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<ResetPasswordResponse>> {
    let body = json_body(body)?;

    let current_password = require_field(
        body.current_password.as_deref(),
        "Current password and new password are required",
    )?;
    let new_password = require_field(
        body.new_password.as_deref(),
        "Current password and new password are required",
    )?;

    if new_password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    let mut profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(current_password, &profile.password_hash)? {
        return Err(AppError::IncorrectPassword);
    }

    profile.password_hash = hash_password(new_password)?;
    state.db.upsert_user(&profile).await?;

    tracing::info!(user_id = %user.user_id, "Password updated");

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password updated successfully".to_string(),
    }))
}
