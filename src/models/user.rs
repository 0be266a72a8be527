//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Account role. Nearly every account is a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// User account stored in Firestore.
///
/// `password_hash` never leaves storage; every API response uses
/// [`PublicUser`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account ID (also used as document ID)
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address, unique across accounts
    pub email: String,
    /// Contact phone number
    pub phone: String,
    /// Account role
    pub role: Role,
    /// Argon2 PHC string for the password
    pub password_hash: String,
    /// Ids of products this user has listed, oldest first
    pub products: Vec<Uuid>,
    /// When the account was created
    pub created_at: String,
}

/// User view returned by the API, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub products: Vec<Uuid>,
    pub created_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            products: user.products,
            created_at: user.created_at,
        }
    }
}
