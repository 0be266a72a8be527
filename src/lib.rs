// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Swapyard: peer-to-peer classifieds marketplace API
//!
//! This crate provides the backend for user accounts, session tokens, and
//! the product listing lifecycle (create, browse, update, delete) with
//! owner-only mutation.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Datastore;
use services::ImageHost;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Datastore,
    pub images: ImageHost,
}
