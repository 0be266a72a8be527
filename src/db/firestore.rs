// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed datastore with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, credential hashes, product ownership lists)
//! - Products (listings)
//!
//! The datastore also has a fully offline in-memory mode
//! ([`Datastore::new_mock`]) so the whole HTTP surface can be exercised in
//! tests without an emulator.

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Product, User};

/// In-memory document map keyed by (collection, document id).
type MemStore = DashMap<(&'static str, String), serde_json::Value>;

/// Datastore handle. Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct Datastore {
    client: Option<firestore::FirestoreDb>,
    mem: Option<Arc<MemStore>>,
}

impl Datastore {
    /// Create a new Firestore-backed datastore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            mem: None,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            mem: None,
        })
    }

    /// Create an in-memory datastore for testing (offline mode).
    ///
    /// Documents live in a process-local map; queries filter and sort in
    /// memory. No Firestore connection is made.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            mem: Some(Arc::new(DashMap::new())),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by account id.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        if let Some(mem) = &self.mem {
            return mem_get(mem, collections::USERS, &user_id.to_string());
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by email address.
    ///
    /// Emails are stored lowercased, so callers lowercase before lookup.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        if let Some(mem) = &self.mem {
            let users: Vec<User> = mem_collection(mem, collections::USERS)?;
            return Ok(users.into_iter().find(|u| u.email == email));
        }

        let email = email.to_string();
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.pop())
    }

    /// Create or update a user document.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        if let Some(mem) = &self.mem {
            return mem_set(mem, collections::USERS, &user.id.to_string(), user);
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Append a product id to a user's products list.
    ///
    /// Returns the updated user, or `None` if the user does not exist.
    /// Duplicate ids are kept; the list is an append log of ownership.
    pub async fn push_user_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };

        user.products.push(product_id);
        self.upsert_user(&user).await?;
        Ok(Some(user))
    }

    /// Remove every occurrence of a product id from a user's products list.
    ///
    /// A missing user is not an error here; the caller decides whether the
    /// gap matters.
    pub async fn pull_user_product(&self, user_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(());
        };

        user.products.retain(|id| *id != product_id);
        self.upsert_user(&user).await
    }

    // ─── Product Operations ──────────────────────────────────────

    /// Get a product by id.
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        if let Some(mem) = &self.mem {
            return mem_get(mem, collections::PRODUCTS, &product_id.to_string());
        }

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PRODUCTS)
            .obj()
            .one(&product_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a product document.
    pub async fn upsert_product(&self, product: &Product) -> Result<(), AppError> {
        if let Some(mem) = &self.mem {
            return mem_set(mem, collections::PRODUCTS, &product.id.to_string(), product);
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PRODUCTS)
            .document_id(product.id.to_string())
            .object(product)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a product document.
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), AppError> {
        if let Some(mem) = &self.mem {
            mem.remove(&(collections::PRODUCTS, product_id.to_string()));
            return Ok(());
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PRODUCTS)
            .document_id(product_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List every product. No pagination; the catalog is read whole.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        if let Some(mem) = &self.mem {
            return mem_collection(mem, collections::PRODUCTS);
        }

        self.get_client()?
            .fluent()
            .select()
            .from(collections::PRODUCTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's products, newest first.
    pub async fn products_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, AppError> {
        if let Some(mem) = &self.mem {
            let mut products: Vec<Product> = mem_collection(mem, collections::PRODUCTS)?;
            products.retain(|p| p.owner_id == owner_id);
            products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            return Ok(products);
        }

        // The owner reference is stored under the field name `user`.
        let owner = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PRODUCTS)
            .filter(move |q| q.field("user").eq(owner.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

// ─── In-Memory Backend Helpers ───────────────────────────────────

fn mem_get<T: DeserializeOwned>(
    mem: &MemStore,
    collection: &'static str,
    doc_id: &str,
) -> Result<Option<T>, AppError> {
    match mem.get(&(collection, doc_id.to_string())) {
        Some(entry) => serde_json::from_value(entry.value().clone())
            .map(Some)
            .map_err(|e| AppError::Database(e.to_string())),
        None => Ok(None),
    }
}

fn mem_set<T: Serialize>(
    mem: &MemStore,
    collection: &'static str,
    doc_id: &str,
    obj: &T,
) -> Result<(), AppError> {
    let value = serde_json::to_value(obj).map_err(|e| AppError::Database(e.to_string()))?;
    mem.insert((collection, doc_id.to_string()), value);
    Ok(())
}

fn mem_collection<T: DeserializeOwned>(
    mem: &MemStore,
    collection: &'static str,
) -> Result<Vec<T>, AppError> {
    mem.iter()
        .filter(|entry| entry.key().0 == collection)
        .map(|entry| {
            serde_json::from_value(entry.value().clone())
                .map_err(|e| AppError::Database(e.to_string()))
        })
        .collect()
}
