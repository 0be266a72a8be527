//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; handlers get a cheap `Clone` of the
//! resulting struct through application state.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS and cookie policy
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Session token lifetime in seconds
    pub jwt_ttl_seconds: i64,
    /// Image host upload endpoint
    pub image_upload_url: String,
    /// Image host upload preset name
    pub image_upload_preset: String,
    /// Directory where multipart uploads are staged before forwarding
    pub upload_staging_dir: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            jwt_ttl_seconds: 86400,
            image_upload_url: "http://localhost:9000/upload".to_string(),
            image_upload_preset: "swapyard".to_string(),
            upload_staging_dir: "./tmp/staging".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, secrets can be set via a `.env` file.
    /// In production, the deployment environment injects them directly.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            jwt_ttl_seconds: env::var("JWT_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),
            image_upload_url: env::var("IMAGE_UPLOAD_URL")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("IMAGE_UPLOAD_URL"))?,
            image_upload_preset: env::var("IMAGE_UPLOAD_PRESET")
                .unwrap_or_else(|_| "swapyard".to_string()),
            upload_staging_dir: env::var("UPLOAD_STAGING_DIR")
                .unwrap_or_else(|_| "./tmp/staging".to_string()),
        })
    }

    /// Whether session cookies should carry the `Secure` attribute.
    ///
    /// Follows the frontend scheme so local HTTP development still works.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
