//! `reqwest` implementation of the remote API traits.

use std::sync::Arc;
use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use url::Url;

use karthik_core::wire::{
    AccountReply, AdminCredentials, AdminLoginReply, DemoRequestReply, ErrorBody, MessageBody,
    ProfileUpdateRequest, UserAction, UserCredentials,
};
use karthik_core::{
    DemoRequest, NewDemoRequest, NewProduct, Product, ProductId, ProductUpdate, Registration,
    UserProfile, Username,
};

use super::{AccountApi, AdminApi, CatalogApi, RemoteError};
use crate::config::ClientConfig;

/// HTTP client for the store API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidBaseUrl`] if `base_url` cannot carry
    /// paths, or [`RemoteError::Transport`] if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, RemoteError> {
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, RemoteError> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    /// Build `<base>/api/<segments...>`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Send a request and parse a JSON success body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| body.chars().take(200).collect(), |e| e.error);
            tracing::debug!(status = %status, message = %message, "API returned non-success status");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            RemoteError::Decode(e)
        })
    }

    /// Submit a demo request.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the request fails or is rejected.
    pub async fn submit_demo_request(
        &self,
        request: &NewDemoRequest,
    ) -> Result<DemoRequest, RemoteError> {
        let url = self.endpoint(&["demo-request"])?;
        let reply: DemoRequestReply = self.send(self.inner.client.post(url).json(request)).await?;
        Ok(reply.data)
    }

    /// All demo requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the request fails.
    pub async fn list_demo_requests(&self) -> Result<Vec<DemoRequest>, RemoteError> {
        let url = self.endpoint(&["demo-request"])?;
        self.send(self.inner.client.get(url)).await
    }
}

impl CatalogApi for ApiClient {
    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        let url = self.endpoint(&["products"])?;
        self.send(self.inner.client.get(url)).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RemoteError> {
        let url = self.endpoint(&["products"])?;
        self.send(self.inner.client.post(url).json(product)).await
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RemoteError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.send(self.inner.client.put(url).json(update)).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let _: MessageBody = self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }
}

impl AccountApi for ApiClient {
    async fn register(&self, registration: &Registration) -> Result<AccountReply, RemoteError> {
        let url = self.endpoint(&["users"])?;
        let body = UserAction::Register(registration.clone());
        self.send(self.inner.client.post(url).json(&body)).await
    }

    async fn login(&self, credentials: &UserCredentials) -> Result<AccountReply, RemoteError> {
        let url = self.endpoint(&["users"])?;
        let body = UserAction::Login(credentials.clone());
        self.send(self.inner.client.post(url).json(&body)).await
    }

    async fn get_user(&self, username: &Username) -> Result<UserProfile, RemoteError> {
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut()
            .append_pair("username", username.as_str());
        self.send(self.inner.client.get(url)).await
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, RemoteError> {
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut().append_pair("all", "true");
        self.send(self.inner.client.get(url)).await
    }

    async fn update_user(
        &self,
        request: &ProfileUpdateRequest,
    ) -> Result<AccountReply, RemoteError> {
        let url = self.endpoint(&["users"])?;
        self.send(self.inner.client.put(url).json(request)).await
    }

    async fn delete_user(&self, username: &Username) -> Result<(), RemoteError> {
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut()
            .append_pair("username", username.as_str());
        let _: MessageBody = self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }
}

impl AdminApi for ApiClient {
    async fn admin_login(
        &self,
        credentials: &AdminCredentials,
    ) -> Result<AdminLoginReply, RemoteError> {
        let url = self.endpoint(&["admin", "login"])?;
        self.send(self.inner.client.post(url).json(credentials)).await
    }
}
