// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swapyard API Server
//!
//! Peer-to-peer classifieds marketplace backend: accounts, session tokens,
//! and product listings with image uploads.

use std::sync::Arc;
use swapyard::{config::Config, db::Datastore, services::ImageHost, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Swapyard API");

    // Initialize Firestore database
    let db = Datastore::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize image host client
    let images = ImageHost::new(
        config.image_upload_url.clone(),
        config.image_upload_preset.clone(),
    );
    tracing::info!(url = %config.image_upload_url, "Image host client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        images,
    });

    // Build router
    let app = swapyard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("swapyard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
