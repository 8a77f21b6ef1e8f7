//! Admin management commands.
//!
//! # Usage
//!
//! ```bash
//! karthik admin create --userid admin --password 'change-me-please'
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use thiserror::Error;

use karthik_api::db::{AdminRepository, RepositoryError};
use karthik_core::AdminUserId;
use karthik_core::MIN_PASSWORD_LENGTH;
use karthik_core::password::{PasswordHashError, hash_password};

use super::DatabaseError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("userid is required")]
    MissingUserId,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error(transparent)]
    Hash(#[from] PasswordHashError),

    #[error("Admin already exists: {0}")]
    AdminExists(String),
}

/// Create an admin with an Argon2id-hashed password.
pub async fn create(userid: &str, password: &str) -> Result<(), AdminError> {
    if userid.trim().is_empty() {
        return Err(AdminError::MissingUserId);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let userid = AdminUserId::new(userid.trim());
    let hash = hash_password(password)?;
    let pool = super::connect().await?;

    tracing::info!("Creating admin: {}", userid);
    AdminRepository::new(&pool)
        .create(&userid, &hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::AdminExists(userid.to_string()),
            other => other.into(),
        })?;

    tracing::info!("Admin created successfully: {}", userid);
    Ok(())
}
