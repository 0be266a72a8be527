// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image host client and upload staging.
//!
//! Incoming multipart files are spooled to a local staging directory first,
//! then forwarded to the external image host in parallel. Staged files are
//! purged best-effort on every exit path.

use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

/// External image host client.
#[derive(Clone)]
pub struct ImageHost {
    /// HTTP client; `None` in offline mock mode
    http: Option<reqwest::Client>,
    /// Upload endpoint
    upload_url: String,
    /// Unsigned upload preset name
    upload_preset: String,
}

/// A multipart file spooled to the staging directory, pending upload.
#[derive(Debug, Clone)]
pub struct StagedImage {
    /// Path in the staging directory
    pub path: PathBuf,
    /// Unique name within the staging directory
    pub staged_name: String,
    /// Original client file name (sanitized)
    pub file_name: String,
    /// Declared content type, if any
    pub content_type: Option<String>,
}

/// Response body from the image host upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl ImageHost {
    /// Create a new image host client.
    pub fn new(upload_url: String, upload_preset: String) -> Self {
        Self {
            http: Some(reqwest::Client::new()),
            upload_url,
            upload_preset,
        }
    }

    /// Create a mock image host for testing (offline mode).
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            http: None,
            upload_url: "http://images.invalid/upload".to_string(),
            upload_preset: "mock".to_string(),
        }
    }

    /// Upload one staged file and return its hosted URL.
    pub async fn upload(&self, image: &StagedImage) -> Result<String, AppError> {
        // Mock mode (Debug builds only)
        #[cfg(debug_assertions)]
        {
            if self.http.is_none() {
                return Ok(format!("https://images.fake.local/{}", image.staged_name));
            }
        }

        let http = self
            .http
            .as_ref()
            .ok_or_else(|| AppError::Upload("image host client not connected".to_string()))?;

        let data = tokio::fs::read(&image.path)
            .await
            .map_err(|e| AppError::Upload(format!("read staged file: {}", e)))?;

        let mut part = reqwest::multipart::Part::bytes(data).file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::Upload(e.to_string()))?;
        }

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!(
                "image host returned {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        Ok(uploaded.secure_url)
    }

    /// Upload a batch of staged files concurrently.
    ///
    /// Results come back in input order, one per staged file.
    pub async fn upload_all(&self, images: &[StagedImage]) -> Vec<Result<String, AppError>> {
        join_all(images.iter().map(|image| self.upload(image))).await
    }
}

/// Write one multipart file part into the staging directory.
///
/// Staged names get a UUID prefix so concurrent requests cannot collide on
/// the original file name.
pub async fn stage_file(
    staging_dir: &str,
    file_name: &str,
    content_type: Option<String>,
    data: &[u8],
) -> Result<StagedImage, AppError> {
    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(|e| AppError::Upload(format!("create staging dir: {}", e)))?;

    let file_name = sanitize_file_name(file_name);
    let staged_name = format!("{}-{}", Uuid::new_v4(), file_name);
    let path = Path::new(staging_dir).join(&staged_name);

    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::Upload(format!("stage upload: {}", e)))?;

    Ok(StagedImage {
        path,
        staged_name,
        file_name,
        content_type,
    })
}

/// Best-effort removal of staged files. Failures are logged, never escalated.
pub async fn purge_staged(images: &[StagedImage]) {
    for image in images {
        if let Err(e) = tokio::fs::remove_file(&image.path).await {
            tracing::warn!(
                path = %image.path.display(),
                error = %e,
                "Failed to remove staged file"
            );
        }
    }
}

/// Keep the successful uploads, logging and dropping the failures.
///
/// URLs come back in input order. Whether an all-failed batch is an error
/// depends on the endpoint; callers decide.
pub fn successful_uploads(results: Vec<Result<String, AppError>>) -> Vec<String> {
    let mut urls = Vec::with_capacity(results.len());

    for result in results {
        match result {
            Ok(url) => urls.push(url),
            Err(e) => tracing::warn!(error = %e, "Dropping failed image upload"),
        }
    }

    urls
}

/// Strip path separators out of a client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
