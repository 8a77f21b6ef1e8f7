//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;
pub mod shop;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the database commands.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Neither `API_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("Missing environment variable: API_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Connect to the API database named by `API_DATABASE_URL` or `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, DatabaseError> {
    dotenvy::dotenv().ok();

    let database_url = ["API_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .map(SecretString::from)
        .ok_or(DatabaseError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(karthik_api::db::create_pool(&database_url).await?)
}
