// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Product listing model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Physical condition of a listed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Condition {
    New,
    #[default]
    Used,
}

/// A product listing stored in Firestore.
///
/// The owner reference serializes as `user` because that is the field name
/// the frontend (and the documents already written) expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Product {
    /// Listing ID (also used as document ID)
    pub id: Uuid,
    /// Listing title
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Asking price
    pub price: f64,
    /// Listing category
    pub category: String,
    /// Where the item is located
    pub location: Option<String>,
    /// Item condition
    pub condition: Condition,
    /// Whether the seller will haggle
    pub negotiable: bool,
    /// Hosted image URLs, between one and four
    pub images: Vec<String>,
    /// Owner's user id
    #[serde(rename = "user")]
    pub owner_id: Uuid,
    /// When the listing was created
    pub created_at: String,
    /// When the listing last changed
    pub updated_at: String,
}
