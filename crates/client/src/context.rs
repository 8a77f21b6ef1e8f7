//! All client managers wired to one store and one API client.

use std::sync::Arc;

use thiserror::Error;

use karthik_core::CurrencyConverter;

use crate::account::AccountSync;
use crate::admin::AdminSync;
use crate::cart::CartEngine;
use crate::catalog::CatalogSync;
use crate::config::ClientConfig;
use crate::remote::{ApiClient, RemoteError};
use crate::storage::StorageManager;
use crate::store::{FileStore, LocalStore, StoreError};

/// Errors raised while assembling a [`Storefront`].
#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// The client side of the store: cart, catalog, shopper and admin managers
/// sharing one local store.
pub struct Storefront<S> {
    pub api: ApiClient,
    pub storage: StorageManager<S>,
    pub cart: CartEngine<S>,
    pub catalog: CatalogSync<S, ApiClient>,
    pub accounts: AccountSync<S, ApiClient>,
    pub admin: AdminSync<S, ApiClient>,
}

impl<S: LocalStore> Storefront<S> {
    /// Wire every manager to `store` and `api`.
    #[must_use]
    pub fn new(store: S, api: ApiClient, currency: Option<CurrencyConverter>) -> Self {
        let storage = StorageManager::from_shared(Arc::new(store));
        Self {
            cart: CartEngine::new(storage.clone(), currency),
            catalog: CatalogSync::new(storage.clone(), api.clone()),
            accounts: AccountSync::new(storage.clone(), api.clone()),
            admin: AdminSync::new(storage.clone(), api.clone()),
            storage,
            api,
        }
    }
}

impl Storefront<FileStore> {
    /// Open the file-backed store and API client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`] if the data directory cannot be created or the
    /// API client cannot be built.
    pub fn open(config: &ClientConfig) -> Result<Self, OpenError> {
        let store = FileStore::open(&config.data_dir)?;
        let api = ApiClient::from_config(config)?;
        Ok(Self::new(store, api, config.currency))
    }
}
