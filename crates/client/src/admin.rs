//! Admin sign-in.
//!
//! Admins sign in against the server. When the server cannot be reached,
//! admins provisioned on this device with
//! [`register_local_admin`](AdminSync::register_local_admin) can still sign
//! in; their passwords are stored as Argon2 hashes.

use chrono::Utc;
use tracing::{debug, info, warn};

use karthik_core::password::{check_password, hash_password};
use karthik_core::wire::AdminCredentials;
use karthik_core::{AdminSession, AdminUserId, MIN_PASSWORD_LENGTH, SessionRecord};

use crate::remote::AdminApi;
use crate::storage::{LocalAdmin, StorageManager};
use crate::store::{LocalStore, StoreError};
use crate::sync::{FallbackPolicy, SyncError, Synced, fall_back};

const POLICY: FallbackPolicy = FallbackPolicy::Unavailable;

/// Admin session manager.
pub struct AdminSync<S, A> {
    storage: StorageManager<S>,
    api: A,
}

impl<S: LocalStore, A: AdminApi> AdminSync<S, A> {
    #[must_use]
    pub const fn new(storage: StorageManager<S>, api: A) -> Self {
        Self { storage, api }
    }

    /// Sign in as an admin.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Rejected`] for bad credentials, whether the
    /// server or the local admin list rejected them.
    pub async fn login(&self, userid: &AdminUserId, password: &str) -> Result<Synced<()>, SyncError> {
        let credentials = AdminCredentials {
            userid: userid.clone(),
            password: password.to_owned(),
        };

        match self.api.admin_login(&credentials).await {
            Ok(_) => {
                self.storage.save_admin_session(&AdminSession::new(userid.clone()))?;
                info!(userid = %userid, "admin logged in");
                Ok(Synced::remote(()))
            }
            Err(e) => {
                fall_back("admin_login", POLICY, e)?;
                self.login_local(userid, password)
            }
        }
    }

    fn login_local(&self, userid: &AdminUserId, password: &str) -> Result<Synced<()>, SyncError> {
        let matched = self
            .storage
            .local_admins()?
            .iter()
            .any(|a| &a.userid == userid && check_password(password, &a.password_hash).is_valid());

        if !matched {
            warn!(userid = %userid, "offline admin login rejected");
            return Err(SyncError::Rejected {
                status: 401,
                message: "Invalid credentials".to_owned(),
            });
        }

        self.storage.save_admin_session(&AdminSession::new(userid.clone()))?;
        info!(userid = %userid, "admin logged in (offline mode)");
        Ok(Synced::local(()))
    }

    /// Provision an admin on this device for offline sign-in.
    ///
    /// Returns `false` if the userid is already provisioned.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] for a blank userid or short password,
    /// or [`SyncError::PasswordHash`] if hashing fails.
    pub fn register_local_admin(
        &self,
        userid: &AdminUserId,
        password: &str,
    ) -> Result<bool, SyncError> {
        if userid.as_str().trim().is_empty() {
            return Err(SyncError::Invalid("userid is required".to_owned()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SyncError::Invalid(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let added = self.storage.add_local_admin(LocalAdmin {
            userid: userid.clone(),
            password_hash: hash_password(password)?,
        })?;
        if added {
            info!(userid = %userid, "provisioned local admin");
        }
        Ok(added)
    }

    /// Whether a live admin session exists. An expired session is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        let Some(session) = self.storage.admin_session()? else {
            return Ok(false);
        };
        if session.is_live_at(Utc::now()) {
            return Ok(true);
        }
        debug!(userid = %session.userid, "admin session expired");
        self.storage.clear_admin_session()?;
        Ok(false)
    }

    /// The stored admin session record, live or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn auth(&self) -> Result<Option<AdminSession>, StoreError> {
        self.storage.admin_session()
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.storage.clear_admin_session()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use karthik_core::wire::AdminLoginReply;

    use super::*;
    use crate::remote::RemoteError;
    use crate::store::MemoryStore;

    /// Admin endpoint that always answers with the given outcome.
    struct FakeAdmin(Option<u16>);

    impl AdminApi for FakeAdmin {
        async fn admin_login(
            &self,
            _credentials: &AdminCredentials,
        ) -> Result<AdminLoginReply, RemoteError> {
            match self.0 {
                None => Ok(AdminLoginReply {
                    success: true,
                    message: "Login successful".to_owned(),
                }),
                Some(status) => Err(RemoteError::Status {
                    status,
                    message: "Invalid credentials".to_owned(),
                }),
            }
        }
    }

    fn sync(outcome: Option<u16>) -> AdminSync<MemoryStore, FakeAdmin> {
        AdminSync::new(StorageManager::new(MemoryStore::new()), FakeAdmin(outcome))
    }

    fn admin() -> AdminUserId {
        AdminUserId::new("admin")
    }

    #[tokio::test]
    async fn test_server_login_creates_session() {
        let admins = sync(None);

        let result = admins.login(&admin(), "whatever-pass").await.unwrap();

        assert!(result.is_remote());
        assert!(admins.is_authenticated().unwrap());
        assert_eq!(admins.auth().unwrap().unwrap().userid, admin());
    }

    #[tokio::test]
    async fn test_server_rejection_is_final() {
        let admins = sync(Some(401));
        admins.register_local_admin(&admin(), "correct-horse").unwrap();

        let err = admins.login(&admin(), "correct-horse").await.unwrap_err();

        assert!(matches!(err, SyncError::Rejected { status: 401, .. }));
        assert!(!admins.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_offline_login_uses_local_admins() {
        let admins = sync(Some(503));
        admins.register_local_admin(&admin(), "correct-horse").unwrap();

        assert!(matches!(
            admins.login(&admin(), "wrong-horse").await,
            Err(SyncError::Rejected { .. })
        ));

        let result = admins.login(&admin(), "correct-horse").await.unwrap();
        assert!(result.is_local());
        assert!(admins.is_authenticated().unwrap());
    }

    #[test]
    fn test_local_admins_are_stored_hashed() {
        let admins = sync(None);
        assert!(admins.register_local_admin(&admin(), "correct-horse").unwrap());
        assert!(!admins.register_local_admin(&admin(), "other-horse").unwrap());

        let stored = admins.storage.local_admins().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.first().unwrap().password_hash.starts_with("$argon2"));
    }

    #[test]
    fn test_register_local_admin_validates_input() {
        let admins = sync(None);
        assert!(matches!(
            admins.register_local_admin(&admin(), "short"),
            Err(SyncError::Invalid(_))
        ));
        assert!(matches!(
            admins.register_local_admin(&AdminUserId::new(" "), "correct-horse"),
            Err(SyncError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_admin_session_is_cleared() {
        let admins = sync(None);
        let mut session = AdminSession::new(admin());
        session.timestamp = Utc::now() - TimeDelta::hours(24) - TimeDelta::seconds(1);
        admins.storage.save_admin_session(&session).unwrap();

        assert!(!admins.is_authenticated().unwrap());
        assert!(admins.auth().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let admins = sync(None);
        admins.login(&admin(), "whatever-pass").await.unwrap();

        admins.logout().unwrap();

        assert!(!admins.is_authenticated().unwrap());
    }
}
