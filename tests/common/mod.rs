// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::sync::Arc;
use swapyard::config::Config;
use swapyard::db::Datastore;
use swapyard::routes::create_router;
use swapyard::services::ImageHost;
use swapyard::AppState;
use tower::ServiceExt;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> Datastore {
    Datastore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline, in-memory).
#[allow(dead_code)]
pub fn test_db_offline() -> Datastore {
    Datastore::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_frontend_url("http://localhost:5173")
}

/// Create a test app with a specific frontend URL, which drives the cookie
/// Secure attribute.
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::default();
    config.frontend_url = frontend_url.to_string();

    let state = Arc::new(AppState {
        config,
        db: Datastore::new_mock(),
        images: ImageHost::new_mock(),
    });

    (create_router(state.clone()), state)
}

/// Create a test JWT the way the login flow does.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, signing_key: &[u8]) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("non-JSON body: {e}"))
}

// ─── Multipart form builder ──────────────────────────────────────────────────

#[allow(dead_code)]
pub const TEST_BOUNDARY: &str = "swapyard-test-boundary-7MA4YWxkTrZu0gW";

/// Hand-rolled multipart/form-data body for oneshot requests.
#[allow(dead_code)]
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

#[allow(dead_code)]
impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{TEST_BOUNDARY}--\r\n").as_bytes());
        self.body
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={TEST_BOUNDARY}")
    }
}

// ─── Request helpers ─────────────────────────────────────────────────────────

/// Register a user and return (user id, bearer token).
#[allow(dead_code)]
pub async fn signup(app: &axum::Router, name: &str, email: &str, password: &str) -> (Uuid, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": name,
                        "email": email,
                        "phone": "555-0100",
                        "password": password,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED, "signup failed");

    let body = body_json(response).await;
    let user_id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Create a one-image listing and return its id.
#[allow(dead_code)]
pub async fn create_product(app: &axum::Router, token: &str, title: &str) -> Uuid {
    let form = MultipartForm::new()
        .text("title", title)
        .text("price", "25")
        .text("category", "electronics")
        .file("images", "photo.jpg", "image/jpeg", b"fake image bytes")
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

    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "product create failed"
    );

    let body = body_json(response).await;
    body["product"]["id"].as_str().unwrap().parse().unwrap()
}
