//! Karthik store REST API.
//!
//! Serves the catalog, shopper accounts, admin login and demo requests that
//! the storefront client mirrors into its local store. Every response is
//! JSON; failures carry `{"error": "..."}`.
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` via sqlx runtime queries
//! - Argon2id password hashes (legacy plain-text admin rows upgraded on login)
//! - Sentry for error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use state::AppState;

/// Build the application router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = match &state.config().cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    routes::routes()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
