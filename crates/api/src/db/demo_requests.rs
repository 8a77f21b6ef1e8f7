//! Demo request repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use karthik_core::{DemoRequest, DemoStatus, Email, NewDemoRequest};

use super::RepositoryError;

const COLUMNS: &str = "name, phone, email, address, reason, status, created_at";

#[derive(FromRow)]
struct DemoRequestRow {
    name: String,
    phone: String,
    email: String,
    address: String,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DemoRequestRow> for DemoRequest {
    type Error = RepositoryError;

    fn try_from(row: DemoRequestRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status = row.status.parse::<DemoStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
        })?;

        Ok(Self {
            name: row.name,
            phone: row.phone,
            email,
            address: row.address,
            reason: row.reason,
            created_at: row.created_at,
            status,
        })
    }
}

/// Repository for demo request database operations.
pub struct DemoRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DemoRequestRepository<'a> {
    /// Create a new demo request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a validated request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        request: &NewDemoRequest,
        email: &Email,
    ) -> Result<DemoRequest, RepositoryError> {
        sqlx::query_as::<_, DemoRequestRow>(&format!(
            "INSERT INTO demo_requests (name, phone, email, address, reason, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(request.name.trim())
        .bind(request.phone.trim())
        .bind(email.as_str())
        .bind(request.address.trim())
        .bind(request.reason.trim())
        .bind(DemoStatus::Pending.to_string())
        .fetch_one(self.pool)
        .await?
        .try_into()
    }

    /// All requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self) -> Result<Vec<DemoRequest>, RepositoryError> {
        sqlx::query_as::<_, DemoRequestRow>(&format!(
            "SELECT {COLUMNS} FROM demo_requests ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(DemoRequest::try_from)
        .collect()
    }
}
