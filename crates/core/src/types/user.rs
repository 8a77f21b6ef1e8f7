//! Shopper accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Username;
use super::status::UserRole;

/// Minimum password length for new accounts and password changes.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A shopper's profile as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: Username,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub permanent_address: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Problems with account input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountInputError {
    #[error("username is required")]
    MissingUsername,
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,
}

fn check_password(password: &str) -> Result<(), AccountInputError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountInputError::WeakPassword);
    }
    Ok(())
}

/// Sign-up form.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: Username,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub permanent_address: String,
}

impl Registration {
    /// # Errors
    ///
    /// Returns [`AccountInputError`] for a blank username or a short password.
    pub fn validate(&self) -> Result<(), AccountInputError> {
        if self.username.as_str().trim().is_empty() {
            return Err(AccountInputError::MissingUsername);
        }
        check_password(&self.password)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Profile edit; only present fields change.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_address: Option<String>,
    /// New password; hashed by the server before storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    /// # Errors
    ///
    /// Returns [`AccountInputError::WeakPassword`] for a short new password.
    pub fn validate(&self) -> Result<(), AccountInputError> {
        self.password.as_deref().map_or(Ok(()), check_password)
    }

    /// Apply the non-secret fields to a profile and bump `updated_at`.
    pub fn apply_to(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        let fields = [
            (&self.full_name, &mut profile.full_name),
            (&self.phone_number, &mut profile.phone_number),
            (&self.email, &mut profile.email),
            (&self.delivery_address, &mut profile.delivery_address),
            (&self.permanent_address, &mut profile.permanent_address),
        ];
        for (update, field) in fields {
            if let Some(value) = update {
                field.clone_from(value);
            }
        }
        profile.updated_at = now;
    }
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("full_name", &self.full_name)
            .field("phone_number", &self.phone_number)
            .field("email", &self.email)
            .field("delivery_address", &self.delivery_address)
            .field("permanent_address", &self.permanent_address)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        let now = Utc::now();
        UserProfile {
            username: Username::new("asha"),
            full_name: "Asha Rao".to_owned(),
            phone_number: String::new(),
            email: "asha@example.com".to_owned(),
            delivery_address: String::new(),
            permanent_address: String::new(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_registration_validation() {
        let mut reg = Registration {
            username: Username::new("asha"),
            password: "long-enough".to_owned(),
            ..Registration::default()
        };
        assert!(reg.validate().is_ok());

        reg.password = "short".to_owned();
        assert_eq!(reg.validate(), Err(AccountInputError::WeakPassword));

        reg.username = Username::new(" ");
        assert_eq!(reg.validate(), Err(AccountInputError::MissingUsername));
    }

    #[test]
    fn test_registration_debug_redacts_password() {
        let reg = Registration {
            username: Username::new("asha"),
            password: "hunter2hunter2".to_owned(),
            ..Registration::default()
        };
        let debug = format!("{reg:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_profile_update_applies_present_fields() {
        let mut p = profile();
        let later = p.updated_at + chrono::TimeDelta::minutes(5);
        let update = ProfileUpdate {
            delivery_address: Some("12 MG Road".to_owned()),
            ..ProfileUpdate::default()
        };
        update.apply_to(&mut p, later);

        assert_eq!(p.delivery_address, "12 MG Road");
        assert_eq!(p.full_name, "Asha Rao");
        assert_eq!(p.updated_at, later);
    }

    #[test]
    fn test_profile_wire_format_is_camel_case() {
        let json = serde_json::to_value(profile()).unwrap();
        assert_eq!(json["fullName"], "Asha Rao");
        assert_eq!(json["role"], "user");
        assert!(json.get("password").is_none());
    }
}
