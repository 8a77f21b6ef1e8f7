//! Local key-value persistence.
//!
//! [`LocalStore`] is the client's equivalent of browser `localStorage`: a
//! synchronous string-to-string map addressed by fixed keys, holding JSON
//! blobs. It is both the write-through cache for server data and the source
//! of truth when the server cannot be reached.
//!
//! There is no locking across a read-modify-write sequence. Two overlapping
//! operations on the same key interleave and the last write wins.
//!
//! # Keys
//!
//! ```text
//! karthik_cart          → Cart JSON
//! karthik_products      → [Product] JSON
//! karthik_user_auth     → UserSession JSON
//! karthik_admin_auth    → AdminSession JSON
//! karthik_admin_users   → [LocalAdmin] JSON
//! ```

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Shopping cart.
    pub const CART: &str = "karthik_cart";

    /// Product snapshot mirrored from the server.
    pub const PRODUCTS: &str = "karthik_products";

    /// Shopper session.
    pub const USER_AUTH: &str = "karthik_user_auth";

    /// Admin session.
    pub const ADMIN_AUTH: &str = "karthik_admin_auth";

    /// Admins provisioned for offline login.
    pub const ADMIN_USERS: &str = "karthik_admin_users";
}

/// Errors raised by a [`LocalStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for storage.
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The key contains characters the backend cannot address.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// A writer panicked while holding the store's lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Synchronous key-value storage for JSON blobs.
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: LocalStore + ?Sized> LocalStore for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }
}
