//! Database layer (Firestore).

pub mod firestore;

pub use firestore::Datastore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
}
