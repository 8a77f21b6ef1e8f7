//! Request and response bodies shared by the API server and its clients.
//!
//! The shapes follow the JSON the browser front-end already speaks, so field
//! names are camelCase and account actions are multiplexed on one endpoint by
//! an `action` tag.

use serde::{Deserialize, Serialize};

use super::demo::DemoRequest;
use super::id::{AdminUserId, Username};
use super::user::{ProfileUpdate, Registration, UserProfile};

/// Error body returned with every 4xx/5xx answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Plain acknowledgement, e.g. after a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Username and password pair for shopper login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: Username,
    pub password: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum UserAction {
    Register(Registration),
    Login(UserCredentials),
}

/// Successful register, login or profile update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReply {
    pub success: bool,
    pub message: String,
    pub user: UserProfile,
}

/// Body of `PUT /api/users`: the target username plus the fields to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub username: Username,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

/// Body of `POST /api/admin/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub userid: AdminUserId,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("userid", &self.userid)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful admin login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLoginReply {
    pub success: bool,
    pub message: String,
}

/// Successful demo request submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoRequestReply {
    pub success: bool,
    pub message: String,
    pub data: DemoRequest,
}
