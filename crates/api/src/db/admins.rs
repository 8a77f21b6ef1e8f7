//! Admin repository.

use sqlx::PgPool;

use karthik_core::AdminUserId;

use super::RepositoryError;

/// Repository for admin database operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The stored password (hash or legacy plain text) for an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password(&self, userid: &AdminUserId) -> Result<Option<String>, RepositoryError> {
        let password = sqlx::query_scalar::<_, String>("SELECT password FROM admins WHERE userid = $1")
            .bind(userid)
            .fetch_optional(self.pool)
            .await?;
        Ok(password)
    }

    /// Create an admin with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the userid already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, userid: &AdminUserId, password_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO admins (userid, password) VALUES ($1, $2)")
            .bind(userid)
            .bind(password_hash)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "admin already exists"))?;
        Ok(())
    }

    /// Replace an admin's stored password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password(&self, userid: &AdminUserId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE admins SET password = $2 WHERE userid = $1")
            .bind(userid)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
