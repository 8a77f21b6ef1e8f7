//! HTTP route handlers for the store API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Database readiness check
//!
//! # Catalog
//! GET    /api/products            - List products
//! POST   /api/products            - Create product (201)
//! PUT    /api/products/{id}       - Update product
//! DELETE /api/products/{id}       - Delete product
//!
//! # Accounts
//! POST   /api/users               - Register or login, by `action`
//! GET    /api/users?username=     - Get one profile
//! GET    /api/users?all=true      - List profiles
//! PUT    /api/users               - Update profile
//! DELETE /api/users?username=     - Delete account
//!
//! # Admin
//! POST   /api/admin/login         - Admin login
//!
//! # Demo requests
//! POST   /api/demo-request        - Submit request (201)
//! GET    /api/demo-request        - List requests, newest first
//! GET    /api/demo-requests       - Alias of the listing
//! ```

pub mod admin;
pub mod demo_requests;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            put(products::update).delete(products::delete),
        )
        .route(
            "/api/users",
            get(users::get)
                .post(users::action)
                .put(users::update)
                .delete(users::delete),
        )
        .route("/api/admin/login", post(admin::login))
        .route(
            "/api/demo-request",
            get(demo_requests::list).post(demo_requests::create),
        )
        .route("/api/demo-requests", get(demo_requests::list))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
