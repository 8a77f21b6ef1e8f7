//! Persisted login state for shoppers and admins.
//!
//! Both records share the same expiry rule: a session is live for
//! [`SESSION_TTL`] after the login that created it, after which it must be
//! treated as logged out and cleared.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AdminUserId, Username};
use super::user::UserProfile;

/// How long a login stays valid.
pub const SESSION_TTL: TimeDelta = TimeDelta::hours(24);

/// Common view over the session records so expiry is decided in one place.
pub trait SessionRecord {
    /// Whether the record claims an authenticated principal.
    fn is_authenticated(&self) -> bool;

    /// When the login happened.
    fn logged_in_at(&self) -> DateTime<Utc>;

    /// Authenticated and younger than [`SESSION_TTL`] at `now`.
    fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated() && now - self.logged_in_at() <= SESSION_TTL
    }
}

/// Shopper session, stored under `karthik_user_auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub username: Username,
    pub is_authenticated: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Profile returned by the server at login, refreshed on profile updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl UserSession {
    /// A fresh authenticated session.
    #[must_use]
    pub fn new(username: Username, user: Option<UserProfile>) -> Self {
        Self {
            username,
            is_authenticated: true,
            timestamp: Utc::now(),
            user,
        }
    }
}

impl SessionRecord for UserSession {
    fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    fn logged_in_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Admin session, stored under `karthik_admin_auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub userid: AdminUserId,
    pub is_authenticated: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl AdminSession {
    /// A fresh authenticated session.
    #[must_use]
    pub fn new(userid: AdminUserId) -> Self {
        Self {
            userid,
            is_authenticated: true,
            timestamp: Utc::now(),
        }
    }
}

impl SessionRecord for AdminSession {
    fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    fn logged_in_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
