//! Startup provisioning.

use secrecy::ExposeSecret;
use sqlx::PgPool;

use karthik_core::password::hash_password;

use crate::config::AdminBootstrap;
use crate::db::{AdminRepository, RepositoryError};
use crate::error::AppError;

/// Create the configured admin unless it already exists.
///
/// An existing admin keeps its current password.
///
/// # Errors
///
/// Returns `AppError` if the lookup, hashing or insert fails.
pub async fn ensure_admin(pool: &PgPool, admin: &AdminBootstrap) -> Result<(), AppError> {
    let repo = AdminRepository::new(pool);

    if repo.get_password(&admin.userid).await?.is_some() {
        tracing::debug!(userid = %admin.userid, "Bootstrap admin already present");
        return Ok(());
    }

    let hash = hash_password(admin.password.expose_secret())?;
    match repo.create(&admin.userid, &hash).await {
        // Another instance created it between the lookup and the insert.
        Ok(()) | Err(RepositoryError::Conflict(_)) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!(userid = %admin.userid, "Bootstrap admin ensured");
    Ok(())
}
