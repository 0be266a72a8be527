// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "swapyard_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Middleware that requires valid JWT authentication.
///
/// The token is taken from the session cookie first, then from an
/// `Authorization: Bearer` header. Handlers behind this middleware read
/// the resolved identity via `Extension<AuthUser>`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(AUTH_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(AppError::Unauthorized),
        }
    };

    let user_id = verify_jwt(&token, &state.config.jwt_signing_key)?;

    let auth_user = AuthUser { user_id };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Verify a session token and extract the user id it names.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<Uuid, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::ExpiredToken,
        _ => AppError::InvalidToken,
    })?;

    Uuid::parse_str(&token_data.claims.sub).map_err(|_| AppError::InvalidToken)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: Uuid, signing_key: &[u8], ttl_seconds: i64) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_seconds.max(0) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
