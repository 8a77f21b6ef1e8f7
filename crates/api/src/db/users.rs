//! Shopper account repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use karthik_core::{ProfileUpdate, Registration, UserProfile, UserRole, Username};

use super::RepositoryError;

const PROFILE_COLUMNS: &str = "username, full_name, phone_number, email, delivery_address, \
                               permanent_address, role, created_at, updated_at";

#[derive(FromRow)]
struct UserRow {
    username: Username,
    full_name: String,
    phone_number: String,
    email: String,
    delivery_address: String,
    permanent_address: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<UserRole>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            username: row.username,
            full_name: row.full_name,
            phone_number: row.phone_number,
            email: row.email,
            delivery_address: row.delivery_address,
            permanent_address: row.permanent_address,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored role is invalid.
    pub async fn get(&self, username: &Username) -> Result<Option<UserProfile>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?
        .map(UserProfile::try_from)
        .transpose()
    }

    /// Get a profile together with its stored password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored role is invalid.
    pub async fn get_with_password(
        &self,
        username: &Username,
    ) -> Result<Option<(UserProfile, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {PROFILE_COLUMNS}, password FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password))),
            None => Ok(None),
        }
    }

    /// All profiles, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored role is invalid.
    pub async fn list(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(UserProfile::try_from)
        .collect()
    }

    /// Create an account with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        registration: &Registration,
        password_hash: &str,
    ) -> Result<UserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password, full_name, phone_number, email,
                                delivery_address, permanent_address, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(&registration.username)
        .bind(password_hash)
        .bind(&registration.full_name)
        .bind(&registration.phone_number)
        .bind(&registration.email)
        .bind(&registration.delivery_address)
        .bind(&registration.permanent_address)
        .bind(UserRole::User.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "username already exists"))?;

        row.try_into()
    }

    /// Apply a profile edit, replacing the password hash when one is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        username: &Username,
        update: &ProfileUpdate,
        password_hash: Option<&str>,
    ) -> Result<UserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET
                 full_name = COALESCE($2, full_name),
                 phone_number = COALESCE($3, phone_number),
                 email = COALESCE($4, email),
                 delivery_address = COALESCE($5, delivery_address),
                 permanent_address = COALESCE($6, permanent_address),
                 password = COALESCE($7, password),
                 updated_at = NOW()
             WHERE username = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(username)
        .bind(update.full_name.as_deref())
        .bind(update.phone_number.as_deref())
        .bind(update.email.as_deref())
        .bind(update.delivery_address.as_deref())
        .bind(update.permanent_address.as_deref())
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, username: &Username) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
