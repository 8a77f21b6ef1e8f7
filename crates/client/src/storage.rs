//! Typed access to the local store.
//!
//! [`StorageManager`] knows which key holds which record and how to encode
//! it. Records that are missing, or that no longer parse, read as their empty
//! default: a corrupted cart becomes an empty cart rather than an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use karthik_core::{
    AdminSession, AdminUserId, Cart, NewProduct, Product, ProductId, ProductUpdate, UserSession,
};

use crate::store::{LocalStore, StoreError, keys};

/// An admin provisioned on this device for offline login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAdmin {
    pub userid: AdminUserId,
    /// Argon2 PHC string; never the plain password.
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// Typed record access over a [`LocalStore`].
pub struct StorageManager<S> {
    store: Arc<S>,
}

impl<S> Clone for StorageManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LocalStore> StorageManager<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    #[must_use]
    pub const fn from_shared(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get_item(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable local record");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_owned(),
            source,
        })?;
        self.store.set_item(key, &json)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The stored cart, or an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn cart(&self) -> Result<Cart, StoreError> {
        Ok(self.read(keys::CART)?.unwrap_or_default())
    }

    /// Persist the cart, stamping it with the write time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn save_cart(&self, cart: &mut Cart) -> Result<(), StoreError> {
        cart.touch();
        self.write(keys::CART, cart)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn clear_cart(&self) -> Result<(), StoreError> {
        self.store.remove_item(keys::CART)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// The product snapshot, or an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.read(keys::PRODUCTS)?.unwrap_or_default())
    }

    /// Replace the whole product snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn save_products(&self, products: &[Product]) -> Result<(), StoreError> {
        debug!(count = products.len(), "saving product snapshot");
        self.write(keys::PRODUCTS, products)
    }

    /// Create a product locally, minting an id when the input has none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn add_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let product = product.into_product();
        self.upsert_product(product.clone())?;
        Ok(product)
    }

    /// Insert `product`, or replace the stored product with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut products = self.products()?;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        self.save_products(&products)
    }

    /// Merge `update` into the stored product. `None` if no such product.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, StoreError> {
        let mut products = self.products()?;
        let Some(product) = products.iter_mut().find(|p| &p.id == id) else {
            return Ok(None);
        };
        update.apply_to(product);
        let updated = product.clone();
        self.save_products(&products)?;
        Ok(Some(updated))
    }

    /// Remove a product. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn delete_product(&self, id: &ProductId) -> Result<bool, StoreError> {
        let mut products = self.products()?;
        let before = products.len();
        products.retain(|p| &p.id != id);
        let removed = products.len() != before;
        self.save_products(&products)?;
        Ok(removed)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn user_session(&self) -> Result<Option<UserSession>, StoreError> {
        self.read(keys::USER_AUTH)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn save_user_session(&self, session: &UserSession) -> Result<(), StoreError> {
        self.write(keys::USER_AUTH, session)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn clear_user_session(&self) -> Result<(), StoreError> {
        self.store.remove_item(keys::USER_AUTH)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn admin_session(&self) -> Result<Option<AdminSession>, StoreError> {
        self.read(keys::ADMIN_AUTH)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn save_admin_session(&self, session: &AdminSession) -> Result<(), StoreError> {
        self.write(keys::ADMIN_AUTH, session)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn clear_admin_session(&self) -> Result<(), StoreError> {
        self.store.remove_item(keys::ADMIN_AUTH)
    }

    // =========================================================================
    // Offline admins
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn local_admins(&self) -> Result<Vec<LocalAdmin>, StoreError> {
        Ok(self.read(keys::ADMIN_USERS)?.unwrap_or_default())
    }

    /// Add an offline admin. Returns `false` if the userid is already present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn add_local_admin(&self, admin: LocalAdmin) -> Result<bool, StoreError> {
        let mut admins = self.local_admins()?;
        if admins.iter().any(|a| a.userid == admin.userid) {
            return Ok(false);
        }
        admins.push(admin);
        self.write(keys::ADMIN_USERS, &admins)?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use karthik_core::{Username, default_catalog};
    use rust_decimal::Decimal;

    use super::*;
    use crate::store::MemoryStore;

    fn storage() -> StorageManager<MemoryStore> {
        StorageManager::new(MemoryStore::new())
    }

    #[test]
    fn test_missing_cart_reads_as_empty() {
        let storage = storage();
        let cart = storage.cart().unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_corrupt_cart_reads_as_empty() {
        let storage = storage();
        storage.store().set_item(keys::CART, "{not json").unwrap();
        assert!(storage.cart().unwrap().is_empty());
    }

    #[test]
    fn test_cart_with_overflowing_total_reads_as_empty() {
        let storage = storage();
        storage
            .store()
            .set_item(
                keys::CART,
                r#"{"items":[{"productId":"p1","name":"P1","price":1e20,"quantity":4294967295}]}"#,
            )
            .unwrap();
        assert!(storage.cart().unwrap().is_empty());
    }

    #[test]
    fn test_save_cart_stamps_timestamp() {
        let storage = storage();
        let mut cart = Cart::empty();
        cart.timestamp = chrono::DateTime::from_timestamp_millis(0).unwrap();
        storage.save_cart(&mut cart).unwrap();

        assert!(cart.timestamp.timestamp_millis() > 0);
        assert_eq!(storage.cart().unwrap().timestamp, cart.timestamp);
    }

    #[test]
    fn test_upsert_replaces_same_id() {
        let storage = storage();
        let mut hdd = default_catalog().remove(0);
        storage.upsert_product(hdd.clone()).unwrap();

        hdd.name = "HDD 2TB".to_owned();
        storage.upsert_product(hdd).unwrap();

        let products = storage.products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products.first().unwrap().name, "HDD 2TB");
    }

    #[test]
    fn test_update_and_delete_report_missing_products() {
        let storage = storage();
        storage.save_products(&default_catalog()).unwrap();
        let missing = ProductId::new("nope");

        assert!(
            storage
                .update_product(&missing, &ProductUpdate::default())
                .unwrap()
                .is_none()
        );
        assert!(!storage.delete_product(&missing).unwrap());
        assert!(storage.delete_product(&ProductId::new("prod_ram_001")).unwrap());
        assert_eq!(storage.products().unwrap().len(), 5);
    }

    #[test]
    fn test_local_admins_are_unique_by_userid() {
        let storage = storage();
        let admin = LocalAdmin {
            userid: AdminUserId::new("admin"),
            password_hash: "$argon2id$stub".to_owned(),
        };
        assert!(storage.add_local_admin(admin.clone()).unwrap());
        assert!(!storage.add_local_admin(admin).unwrap());
        assert_eq!(storage.local_admins().unwrap().len(), 1);
    }

    #[test]
    fn test_sessions_round_trip_and_clear() {
        let storage = storage();
        storage
            .save_user_session(&UserSession::new(Username::new("asha"), None))
            .unwrap();
        assert!(storage.user_session().unwrap().is_some());

        storage.clear_user_session().unwrap();
        assert!(storage.user_session().unwrap().is_none());
    }
}
