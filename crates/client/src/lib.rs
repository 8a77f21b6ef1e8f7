//! Client library for the Karthik store.
//!
//! The managers here try the API server first and fall back to a local
//! key-value store when the server cannot be used:
//!
//! - [`CartEngine`] - cart mutations and totals; local only
//! - [`CatalogSync`] - product catalog
//! - [`AccountSync`] - shopper registration, login and profiles
//! - [`AdminSync`] - admin login, with offline sign-in for provisioned admins
//!
//! Every synced result carries an [`Origin`] saying which side answered.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod context;
pub mod remote;
pub mod storage;
pub mod store;
pub mod sync;

pub use account::AccountSync;
pub use admin::AdminSync;
pub use cart::{CartEngine, CartUpdateError, CartUpdated};
pub use catalog::CatalogSync;
pub use config::{ClientConfig, ConfigError};
pub use context::{OpenError, Storefront};
pub use remote::{AccountApi, AdminApi, ApiClient, CatalogApi, RemoteError};
pub use storage::{LocalAdmin, StorageManager};
pub use store::{FileStore, LocalStore, MemoryStore, StoreError};
pub use sync::{FallbackPolicy, Origin, SyncError, Synced};
