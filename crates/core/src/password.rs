//! Password hashing.
//!
//! New credentials are always stored as Argon2id PHC strings. Older admin
//! rows may still hold the password in plain text; [`check_password`]
//! reports those matches separately so the caller can upgrade the row.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hashing failed inside the Argon2 implementation.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed")]
pub struct PasswordHashError;

/// Outcome of checking a candidate password against a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Matched a hashed value.
    Valid,
    /// Matched a legacy plain-text value; the stored value should be re-hashed.
    ValidLegacy,
    Invalid,
}

impl PasswordCheck {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid | Self::ValidLegacy)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns [`PasswordHashError`] if Argon2 rejects its inputs.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordHashError)
}

/// Whether a stored value looks like a modular-crypt / PHC hash rather than plain text.
#[must_use]
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with('$')
}

/// Check `candidate` against a stored value that may be hashed or legacy plain text.
#[must_use]
pub fn check_password(candidate: &str, stored: &str) -> PasswordCheck {
    if !is_hashed(stored) {
        return if !stored.is_empty() && candidate == stored {
            PasswordCheck::ValidLegacy
        } else {
            PasswordCheck::Invalid
        };
    }

    let Ok(parsed) = PasswordHash::new(stored) else {
        return PasswordCheck::Invalid;
    };
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => PasswordCheck::Valid,
        Err(_) => PasswordCheck::Invalid,
    }
}
