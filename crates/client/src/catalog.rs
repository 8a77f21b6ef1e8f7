//! Product catalog with server-first reads and writes.
//!
//! The catalog tolerates every kind of server failure: if the API is down or
//! refuses a write, the change is made to the local snapshot instead.

use tracing::{debug, info};

use karthik_core::{NewProduct, Product, ProductId, ProductUpdate, default_catalog};

use crate::remote::CatalogApi;
use crate::storage::StorageManager;
use crate::store::LocalStore;
use crate::sync::{FallbackPolicy, SyncError, Synced, fall_back};

const POLICY: FallbackPolicy = FallbackPolicy::AnyFailure;

/// Catalog manager.
pub struct CatalogSync<S, A> {
    storage: StorageManager<S>,
    api: A,
}

impl<S: LocalStore, A: CatalogApi> CatalogSync<S, A> {
    #[must_use]
    pub const fn new(storage: StorageManager<S>, api: A) -> Self {
        Self { storage, api }
    }

    /// Fetch the catalog. A server answer replaces the local snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the local store fails.
    pub async fn load_products(&self) -> Result<Synced<Vec<Product>>, SyncError> {
        match self.api.list_products().await {
            Ok(products) => {
                self.storage.save_products(&products)?;
                debug!(count = products.len(), "mirrored server catalog");
                Ok(Synced::remote(products))
            }
            Err(e) => {
                fall_back("load_products", POLICY, e)?;
                Ok(Synced::local(self.storage.products()?))
            }
        }
    }

    /// Like [`load_products`](Self::load_products), but an empty result is
    /// replaced by the built-in default catalog, which is saved locally.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the local store fails.
    pub async fn initialize_products(&self) -> Result<Synced<Vec<Product>>, SyncError> {
        let loaded = self.load_products().await?;
        if !loaded.value.is_empty() {
            return Ok(loaded);
        }

        let defaults = default_catalog();
        self.storage.save_products(&defaults)?;
        info!(count = defaults.len(), "seeded local store with default catalog");
        Ok(Synced::local(defaults))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] for a nameless or negatively priced
    /// product, or [`SyncError::Store`] if the local store fails.
    pub async fn add_product(&self, product: NewProduct) -> Result<Synced<Product>, SyncError> {
        product.validate()?;

        match self.api.create_product(&product).await {
            Ok(saved) => {
                self.storage.upsert_product(saved.clone())?;
                debug!(product_id = %saved.id, "mirrored created product");
                Ok(Synced::remote(saved))
            }
            Err(e) => {
                fall_back("add_product", POLICY, e)?;
                Ok(Synced::local(self.storage.add_product(product)?))
            }
        }
    }

    /// Merge `update` into an existing product.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] for invalid fields,
    /// [`SyncError::NotFound`] if the local fallback has no such product, or
    /// [`SyncError::Store`] if the local store fails.
    pub async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Synced<Product>, SyncError> {
        update.validate()?;

        match self.api.update_product(id, update).await {
            Ok(updated) => {
                self.storage.upsert_product(updated.clone())?;
                debug!(product_id = %updated.id, "mirrored updated product");
                Ok(Synced::remote(updated))
            }
            Err(e) => {
                fall_back("update_product", POLICY, e)?;
                self.storage
                    .update_product(id, update)?
                    .map(Synced::local)
                    .ok_or_else(|| SyncError::NotFound(format!("product {id}")))
            }
        }
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if the local fallback has no such
    /// product, or [`SyncError::Store`] if the local store fails.
    pub async fn delete_product(&self, id: &ProductId) -> Result<Synced<()>, SyncError> {
        match self.api.delete_product(id).await {
            Ok(()) => {
                self.storage.delete_product(id)?;
                debug!(product_id = %id, "mirrored product deletion");
                Ok(Synced::remote(()))
            }
            Err(e) => {
                fall_back("delete_product", POLICY, e)?;
                if self.storage.delete_product(id)? {
                    Ok(Synced::local(()))
                } else {
                    Err(SyncError::NotFound(format!("product {id}")))
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;

    use super::*;
    use crate::remote::RemoteError;
    use crate::store::MemoryStore;
    use crate::sync::Origin;

    /// In-memory catalog server, or a dead one.
    #[derive(Default)]
    struct FakeCatalog {
        products: Mutex<Vec<Product>>,
        fail_with: Option<u16>,
    }

    impl FakeCatalog {
        fn serving(products: Vec<Product>) -> Self {
            Self {
                products: Mutex::new(products),
                fail_with: None,
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                fail_with: Some(status),
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), RemoteError> {
            match self.fail_with {
                Some(status) => Err(RemoteError::Status {
                    status,
                    message: "boom".to_owned(),
                }),
                None => Ok(()),
            }
        }
    }

    impl CatalogApi for FakeCatalog {
        async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
            self.check()?;
            Ok(self.products.lock().unwrap().clone())
        }

        async fn create_product(&self, product: &NewProduct) -> Result<Product, RemoteError> {
            self.check()?;
            let product = product.clone().into_product();
            self.products.lock().unwrap().push(product.clone());
            Ok(product)
        }

        async fn update_product(
            &self,
            id: &ProductId,
            update: &ProductUpdate,
        ) -> Result<Product, RemoteError> {
            self.check()?;
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| RemoteError::Status {
                    status: 404,
                    message: "Product not found".to_owned(),
                })?;
            update.apply_to(product);
            Ok(product.clone())
        }

        async fn delete_product(&self, id: &ProductId) -> Result<(), RemoteError> {
            self.check()?;
            self.products.lock().unwrap().retain(|p| &p.id != id);
            Ok(())
        }
    }

    fn sync(api: FakeCatalog) -> CatalogSync<MemoryStore, FakeCatalog> {
        CatalogSync::new(StorageManager::new(MemoryStore::new()), api)
    }

    fn widget() -> NewProduct {
        NewProduct {
            name: "Patch Panel".to_owned(),
            price: Decimal::new(4999, 2),
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_remote_load_overwrites_local_snapshot() {
        let mut server = default_catalog();
        server.truncate(2);
        let catalog = sync(FakeCatalog::serving(server.clone()));
        catalog.storage.save_products(&default_catalog()).unwrap();

        let loaded = catalog.load_products().await.unwrap();

        assert_eq!(loaded.origin, Origin::Remote);
        assert_eq!(loaded.value, server);
        assert_eq!(catalog.storage.products().unwrap(), server);
    }

    #[tokio::test]
    async fn test_failed_load_returns_local_snapshot() {
        let catalog = sync(FakeCatalog::failing(500));
        let mut snapshot = default_catalog();
        snapshot.truncate(3);
        catalog.storage.save_products(&snapshot).unwrap();

        let loaded = catalog.load_products().await.unwrap();

        assert_eq!(loaded.origin, Origin::Local);
        assert_eq!(loaded.value, snapshot);
    }

    #[tokio::test]
    async fn test_failed_load_with_empty_store_is_empty() {
        let catalog = sync(FakeCatalog::failing(503));
        let loaded = catalog.load_products().await.unwrap();
        assert!(loaded.is_local());
        assert!(loaded.value.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_seeds_defaults_when_everything_is_empty() {
        let catalog = sync(FakeCatalog::serving(Vec::new()));

        let products = catalog.initialize_products().await.unwrap();

        assert_eq!(products.value.len(), 6);
        assert_eq!(catalog.storage.products().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_add_mirrors_server_result() {
        let catalog = sync(FakeCatalog::serving(Vec::new()));

        let added = catalog.add_product(widget()).await.unwrap();

        assert!(added.is_remote());
        assert!(added.value.id.as_str().starts_with("prod_"));
        assert_eq!(catalog.storage.products().unwrap(), vec![added.value]);
    }

    #[tokio::test]
    async fn test_add_falls_back_even_on_client_errors() {
        let catalog = sync(FakeCatalog::failing(400));

        let added = catalog.add_product(widget()).await.unwrap();

        assert!(added.is_local());
        assert_eq!(catalog.storage.products().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_product_before_calling_server() {
        let catalog = sync(FakeCatalog::serving(Vec::new()));
        let mut product = widget();
        product.name = "  ".to_owned();

        let err = catalog.add_product(product).await.unwrap_err();

        assert!(matches!(err, SyncError::Invalid(_)));
        assert!(catalog.api.products.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_update_merges_fields() {
        let catalog = sync(FakeCatalog::failing(500));
        catalog.storage.save_products(&default_catalog()).unwrap();
        let id = ProductId::new("prod_ram_001");
        let update = ProductUpdate {
            price: Some(Decimal::new(11999, 2)),
            ..ProductUpdate::default()
        };

        let updated = catalog.update_product(&id, &update).await.unwrap();

        assert!(updated.is_local());
        assert_eq!(updated.value.price, Decimal::new(11999, 2));
        assert_eq!(updated.value.name, "RAM");
    }

    #[tokio::test]
    async fn test_offline_update_of_missing_product_is_not_found() {
        let catalog = sync(FakeCatalog::failing(500));
        let err = catalog
            .update_product(&ProductId::new("prod_gone"), &ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_mirrors_and_falls_back() {
        let id = ProductId::new("prod_hdd_001");

        let online = sync(FakeCatalog::serving(default_catalog()));
        online.storage.save_products(&default_catalog()).unwrap();
        assert!(online.delete_product(&id).await.unwrap().is_remote());
        assert_eq!(online.storage.products().unwrap().len(), 5);

        let offline = sync(FakeCatalog::failing(500));
        offline.storage.save_products(&default_catalog()).unwrap();
        assert!(offline.delete_product(&id).await.unwrap().is_local());
        assert!(matches!(
            offline.delete_product(&id).await,
            Err(SyncError::NotFound(_))
        ));
    }
}
