//! Shared pieces of the remote-first, local-fallback managers.
//!
//! Every manager operation tries the server first. A success is mirrored into
//! the local store and returned as [`Origin::Remote`]. A failure that the
//! operation's [`FallbackPolicy`] tolerates is replaced by the same operation
//! against the local store, returned as [`Origin::Local`]. Nothing is queued
//! for later replay and the two sides are never reconciled.

use thiserror::Error;
use tracing::warn;

use karthik_core::password::PasswordHashError;
use karthik_core::{AccountInputError, ProductError};

use crate::remote::RemoteError;
use crate::store::StoreError;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The server answered and the local store was updated to match.
    Remote,
    /// The server was not usable; the local store answered instead.
    Local,
}

/// A manager result tagged with its [`Origin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synced<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Synced<T> {
    #[must_use]
    pub const fn remote(value: T) -> Self {
        Self {
            value,
            origin: Origin::Remote,
        }
    }

    #[must_use]
    pub const fn local(value: T) -> Self {
        Self {
            value,
            origin: Origin::Local,
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.origin == Origin::Remote
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.origin == Origin::Local
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Synced<U> {
        Synced {
            value: f(self.value),
            origin: self.origin,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Which remote failures may be answered from the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Any failure, including a 4xx answer. Used by the catalog.
    AnyFailure,
    /// Only failures where the server gave no definitive answer. Used by
    /// account and admin flows, where a 4xx is the answer.
    Unavailable,
}

impl FallbackPolicy {
    #[must_use]
    pub fn allows(self, err: &RemoteError) -> bool {
        match self {
            Self::AnyFailure => true,
            Self::Unavailable => err.is_unavailable(),
        }
    }
}

/// Errors returned by the sync managers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Input failed validation before any call was made.
    #[error("{0}")]
    Invalid(String),

    /// The record does not exist on whichever side answered.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server refused the request (bad credentials, duplicate, ...).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The server could not be used and the operation has no local path.
    #[error("server unavailable: {0}")]
    Unavailable(#[source] RemoteError),

    /// Local store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A password could not be hashed for local storage.
    #[error("failed to hash password")]
    PasswordHash,
}

impl SyncError {
    /// Message suitable for showing to a shopper or admin.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(message) | Self::Rejected { message, .. } => message.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unavailable(_) => "Server unavailable. Please try again.".to_owned(),
            Self::Store(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_owned()
            }
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Status { status: 404, message } => Self::NotFound(message),
            RemoteError::Status { status, message } if status < 500 => {
                Self::Rejected { status, message }
            }
            other => Self::Unavailable(other),
        }
    }
}

impl From<ProductError> for SyncError {
    fn from(err: ProductError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<AccountInputError> for SyncError {
    fn from(err: AccountInputError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<PasswordHashError> for SyncError {
    fn from(_: PasswordHashError) -> Self {
        Self::PasswordHash
    }
}

/// Decide whether `operation` may continue against the local store.
///
/// When `policy` tolerates the failure it is logged and handed back, for
/// local paths that can still come up empty. Otherwise it is converted into
/// the caller's error.
pub(crate) fn fall_back(
    operation: &'static str,
    policy: FallbackPolicy,
    err: RemoteError,
) -> Result<RemoteError, SyncError> {
    if policy.allows(&err) {
        warn!(operation, error = %err, "remote call failed, using local store");
        Ok(err)
    } else {
        Err(err.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(status: u16) -> RemoteError {
        RemoteError::Status {
            status,
            message: "Invalid credentials".to_owned(),
        }
    }

    #[test]
    fn test_policies() {
        assert!(FallbackPolicy::AnyFailure.allows(&status(400)));
        assert!(FallbackPolicy::AnyFailure.allows(&status(500)));
        assert!(!FallbackPolicy::Unavailable.allows(&status(401)));
        assert!(FallbackPolicy::Unavailable.allows(&status(502)));
    }

    #[test]
    fn test_remote_error_classification() {
        assert!(matches!(SyncError::from(status(404)), SyncError::NotFound(_)));
        assert!(matches!(
            SyncError::from(status(401)),
            SyncError::Rejected { status: 401, .. }
        ));
        assert!(matches!(SyncError::from(status(503)), SyncError::Unavailable(_)));
    }

    #[test]
    fn test_fall_back_refuses_definitive_answers() {
        assert!(fall_back("login", FallbackPolicy::Unavailable, status(503)).is_ok());
        let err = fall_back("login", FallbackPolicy::Unavailable, status(401)).unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_synced_map_keeps_origin() {
        let synced = Synced::local(vec![1, 2, 3]).map(|v| v.len());
        assert!(synced.is_local());
        assert_eq!(synced.into_inner(), 3);
    }
}
