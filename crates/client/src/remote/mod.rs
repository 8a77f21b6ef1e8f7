//! Remote API access.
//!
//! The sync managers talk to the server through the [`CatalogApi`],
//! [`AccountApi`] and [`AdminApi`] traits so tests can substitute fakes.
//! [`ApiClient`] is the `reqwest` implementation of all three.

mod client;

pub use client::ApiClient;

use std::future::Future;

use reqwest::StatusCode;
use thiserror::Error;

use karthik_core::wire::{
    AccountReply, AdminCredentials, AdminLoginReply, ProfileUpdateRequest, UserCredentials,
};
use karthik_core::{
    NewProduct, Product, ProductId, ProductUpdate, Registration, UserProfile, Username,
};

/// Errors from a remote API call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot carry API paths.
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl RemoteError {
    /// Whether the server could not give a definitive answer.
    ///
    /// Transport failures, unparseable bodies and 5xx statuses count; 4xx
    /// answers do not.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Decode(_) => true,
            Self::Status { status, .. } => *status >= StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            Self::InvalidBaseUrl(_) => false,
        }
    }
}

/// Product catalog endpoints.
pub trait CatalogApi: Send + Sync {
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, RemoteError>> + Send;

    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RemoteError>> + Send;

    fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> impl Future<Output = Result<Product, RemoteError>> + Send;

    fn delete_product(&self, id: &ProductId)
    -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Shopper account endpoints.
pub trait AccountApi: Send + Sync {
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AccountReply, RemoteError>> + Send;

    fn login(
        &self,
        credentials: &UserCredentials,
    ) -> impl Future<Output = Result<AccountReply, RemoteError>> + Send;

    fn get_user(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<UserProfile, RemoteError>> + Send;

    fn list_users(&self) -> impl Future<Output = Result<Vec<UserProfile>, RemoteError>> + Send;

    fn update_user(
        &self,
        request: &ProfileUpdateRequest,
    ) -> impl Future<Output = Result<AccountReply, RemoteError>> + Send;

    fn delete_user(&self, username: &Username)
    -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Admin endpoints.
pub trait AdminApi: Send + Sync {
    fn admin_login(
        &self,
        credentials: &AdminCredentials,
    ) -> impl Future<Output = Result<AdminLoginReply, RemoteError>> + Send;
}
