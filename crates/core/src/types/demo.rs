//! Product demo requests submitted from the marketing site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};
use super::status::DemoStatus;

/// Problems with a submitted demo request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DemoRequestError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),
}

/// Demo request form as submitted. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDemoRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub reason: String,
}

impl NewDemoRequest {
    /// Check that every field is filled in and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns the first [`DemoRequestError`] found, in form order.
    pub fn validate(&self) -> Result<Email, DemoRequestError> {
        let fields = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("address", &self.address),
            ("reason", &self.reason),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DemoRequestError::MissingField(*field));
        }
        Ok(Email::parse(&self.email)?)
    }
}

/// A stored demo request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRequest {
    pub name: String,
    pub phone: String,
    pub email: Email,
    pub address: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: DemoStatus,
}
