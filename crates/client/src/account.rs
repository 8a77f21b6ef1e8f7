//! Shopper accounts and the shopper session.
//!
//! Credentials are only ever checked by the server; there is no offline
//! login. When the server is unreachable, profile reads and edits for the
//! signed-in shopper are served from the profile cached in the session.

use chrono::Utc;
use tracing::{debug, info};

use karthik_core::wire::{ProfileUpdateRequest, UserCredentials};
use karthik_core::{
    ProfileUpdate, Registration, SessionRecord, UserProfile, UserSession, Username,
};

use crate::remote::AccountApi;
use crate::storage::StorageManager;
use crate::store::{LocalStore, StoreError};
use crate::sync::{FallbackPolicy, SyncError, Synced, fall_back};

const POLICY: FallbackPolicy = FallbackPolicy::Unavailable;

/// Shopper account manager.
pub struct AccountSync<S, A> {
    storage: StorageManager<S>,
    api: A,
}

impl<S: LocalStore, A: AccountApi> AccountSync<S, A> {
    #[must_use]
    pub const fn new(storage: StorageManager<S>, api: A) -> Self {
        Self { storage, api }
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] for bad input, [`SyncError::Rejected`]
    /// if the username is taken, or [`SyncError::Unavailable`] if the server
    /// cannot be reached.
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, SyncError> {
        registration.validate()?;

        let reply = self.api.register(registration).await?;
        self.storage.save_user_session(&UserSession::new(
            reply.user.username.clone(),
            Some(reply.user.clone()),
        ))?;
        info!(username = %reply.user.username, "registered");
        Ok(reply.user)
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Rejected`] for bad credentials or
    /// [`SyncError::Unavailable`] if the server cannot be reached.
    pub async fn login(&self, username: &Username, password: &str) -> Result<UserProfile, SyncError> {
        let credentials = UserCredentials {
            username: username.clone(),
            password: password.to_owned(),
        };

        let reply = self.api.login(&credentials).await?;
        self.storage
            .save_user_session(&UserSession::new(username.clone(), Some(reply.user.clone())))?;
        info!(username = %username, "logged in");
        Ok(reply.user)
    }

    /// Whether a live session exists. An expired session is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read or written.
    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        let Some(session) = self.storage.user_session()? else {
            return Ok(false);
        };
        if session.is_live_at(Utc::now()) {
            return Ok(true);
        }
        debug!(username = %session.username, "session expired");
        self.storage.clear_user_session()?;
        Ok(false)
    }

    /// The stored session record, live or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn auth(&self) -> Result<Option<UserSession>, StoreError> {
        self.storage.user_session()
    }

    /// Profile cached in the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn current_user(&self) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.auth()?.and_then(|s| s.user))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn current_username(&self) -> Result<Option<Username>, StoreError> {
        Ok(self.auth()?.map(|s| s.username))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.storage.clear_user_session()
    }

    /// Fetch a profile.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] for an unknown user, or
    /// [`SyncError::Unavailable`] if the server cannot be reached and the
    /// profile is not the cached one.
    pub async fn get_profile(&self, username: &Username) -> Result<Synced<UserProfile>, SyncError> {
        match self.api.get_user(username).await {
            Ok(profile) => Ok(Synced::remote(profile)),
            Err(e) => {
                let e = fall_back("get_profile", POLICY, e)?;
                self.cached_profile(username)?
                    .map(Synced::local)
                    .ok_or(SyncError::Unavailable(e))
            }
        }
    }

    /// Edit a profile. Editing the signed-in shopper refreshes the session.
    ///
    /// Offline, non-password edits to the signed-in shopper are applied to
    /// the cached profile only.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] for a weak password,
    /// [`SyncError::NotFound`] for an unknown user, or
    /// [`SyncError::Unavailable`] if the server cannot be reached and the edit
    /// cannot be applied locally.
    pub async fn update_profile(
        &self,
        username: &Username,
        update: ProfileUpdate,
    ) -> Result<Synced<UserProfile>, SyncError> {
        update.validate()?;

        let request = ProfileUpdateRequest {
            username: username.clone(),
            update,
        };
        match self.api.update_user(&request).await {
            Ok(reply) => {
                self.refresh_cached_profile(&reply.user)?;
                Ok(Synced::remote(reply.user))
            }
            Err(e) => {
                let e = fall_back("update_profile", POLICY, e)?;
                if request.update.password.is_some() {
                    return Err(SyncError::Unavailable(e));
                }
                let Some(mut profile) = self.cached_profile(username)? else {
                    return Err(SyncError::Unavailable(e));
                };
                request.update.apply_to(&mut profile, Utc::now());
                self.refresh_cached_profile(&profile)?;
                Ok(Synced::local(profile))
            }
        }
    }

    /// Every account. Server only.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unavailable`] if the server cannot be reached.
    pub async fn get_all_users(&self) -> Result<Vec<UserProfile>, SyncError> {
        Ok(self.api.list_users().await?)
    }

    /// Delete an account. Server only.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] for an unknown user, or
    /// [`SyncError::Unavailable`] if the server cannot be reached.
    pub async fn delete_user(&self, username: &Username) -> Result<(), SyncError> {
        self.api.delete_user(username).await?;
        info!(username = %username, "deleted user");
        Ok(())
    }

    fn cached_profile(&self, username: &Username) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .storage
            .user_session()?
            .filter(|s| &s.username == username)
            .and_then(|s| s.user))
    }

    fn refresh_cached_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let Some(mut session) = self.storage.user_session()? else {
            return Ok(());
        };
        if session.username != profile.username {
            return Ok(());
        }
        session.user = Some(profile.clone());
        self.storage.save_user_session(&session)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::{DateTime, TimeDelta, Utc};
    use karthik_core::UserRole;
    use karthik_core::wire::AccountReply;

    use super::*;
    use crate::remote::RemoteError;
    use crate::store::MemoryStore;

    fn profile(username: &str) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            username: Username::new(username),
            full_name: "Asha Rao".to_owned(),
            phone_number: String::new(),
            email: "asha@example.in".to_owned(),
            delivery_address: String::new(),
            permanent_address: String::new(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    fn rejected(status: u16, message: &str) -> RemoteError {
        RemoteError::Status {
            status,
            message: message.to_owned(),
        }
    }

    /// Accounts server keeping plain-text passwords, or a dead one.
    #[derive(Default)]
    struct FakeAccounts {
        users: Mutex<HashMap<Username, (String, UserProfile)>>,
        down: bool,
    }

    impl FakeAccounts {
        fn down() -> Self {
            Self {
                down: true,
                ..Self::default()
            }
        }

        fn with_user(username: &str, password: &str) -> Self {
            let fake = Self::default();
            fake.users.lock().unwrap().insert(
                Username::new(username),
                (password.to_owned(), profile(username)),
            );
            fake
        }

        fn check(&self) -> Result<(), RemoteError> {
            if self.down {
                return Err(rejected(503, "Service Unavailable"));
            }
            Ok(())
        }

        fn reply(user: UserProfile, message: &str) -> AccountReply {
            AccountReply {
                success: true,
                message: message.to_owned(),
                user,
            }
        }
    }

    impl AccountApi for FakeAccounts {
        async fn register(&self, registration: &Registration) -> Result<AccountReply, RemoteError> {
            self.check()?;
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&registration.username) {
                return Err(rejected(400, "Username already exists"));
            }
            let user = profile(registration.username.as_str());
            users.insert(
                registration.username.clone(),
                (registration.password.clone(), user.clone()),
            );
            Ok(Self::reply(user, "User registered successfully"))
        }

        async fn login(&self, credentials: &UserCredentials) -> Result<AccountReply, RemoteError> {
            self.check()?;
            let users = self.users.lock().unwrap();
            match users.get(&credentials.username) {
                Some((password, user)) if *password == credentials.password => {
                    Ok(Self::reply(user.clone(), "Login successful"))
                }
                _ => Err(rejected(401, "Invalid username or password")),
            }
        }

        async fn get_user(&self, username: &Username) -> Result<UserProfile, RemoteError> {
            self.check()?;
            self.users
                .lock()
                .unwrap()
                .get(username)
                .map(|(_, user)| user.clone())
                .ok_or_else(|| rejected(404, "User not found"))
        }

        async fn list_users(&self) -> Result<Vec<UserProfile>, RemoteError> {
            self.check()?;
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .map(|(_, user)| user.clone())
                .collect())
        }

        async fn update_user(
            &self,
            request: &ProfileUpdateRequest,
        ) -> Result<AccountReply, RemoteError> {
            self.check()?;
            let mut users = self.users.lock().unwrap();
            let (_, user) = users
                .get_mut(&request.username)
                .ok_or_else(|| rejected(404, "User not found"))?;
            request.update.apply_to(user, Utc::now());
            Ok(Self::reply(user.clone(), "Profile updated successfully"))
        }

        async fn delete_user(&self, username: &Username) -> Result<(), RemoteError> {
            self.check()?;
            self.users
                .lock()
                .unwrap()
                .remove(username)
                .map(|_| ())
                .ok_or_else(|| rejected(404, "User not found"))
        }
    }

    fn sync(api: FakeAccounts) -> AccountSync<MemoryStore, FakeAccounts> {
        AccountSync::new(StorageManager::new(MemoryStore::new()), api)
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: Username::new(username),
            password: "long-enough".to_owned(),
            ..Registration::default()
        }
    }

    fn session_at(username: &str, timestamp: DateTime<Utc>) -> UserSession {
        let mut session = UserSession::new(Username::new(username), Some(profile(username)));
        session.timestamp = timestamp;
        session
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let accounts = sync(FakeAccounts::default());

        let user = accounts.register(&registration("asha")).await.unwrap();

        assert_eq!(user.username.as_str(), "asha");
        assert!(accounts.is_authenticated().unwrap());
        assert_eq!(accounts.current_user().unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let accounts = sync(FakeAccounts::with_user("asha", "long-enough"));

        let err = accounts.register(&registration("asha")).await.unwrap_err();

        assert!(matches!(err, SyncError::Rejected { status: 400, .. }));
        assert_eq!(err.user_message(), "Username already exists");
        assert!(!accounts.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_weak_password_never_reaches_server() {
        let accounts = sync(FakeAccounts::down());
        let mut form = registration("asha");
        form.password = "short".to_owned();

        assert!(matches!(
            accounts.register(&form).await,
            Err(SyncError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let accounts = sync(FakeAccounts::with_user("asha", "long-enough"));
        let asha = Username::new("asha");

        assert!(matches!(
            accounts.login(&asha, "wrong-password").await,
            Err(SyncError::Rejected { status: 401, .. })
        ));
        assert!(!accounts.is_authenticated().unwrap());

        accounts.login(&asha, "long-enough").await.unwrap();
        assert!(accounts.is_authenticated().unwrap());
        assert_eq!(accounts.current_username().unwrap(), Some(asha));

        accounts.logout().unwrap();
        assert!(accounts.auth().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_while_server_down_is_unavailable() {
        let accounts = sync(FakeAccounts::down());
        let err = accounts
            .login(&Username::new("asha"), "long-enough")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Unavailable(_)));
    }

    #[test]
    fn test_expired_session_is_cleared_on_check() {
        let accounts = sync(FakeAccounts::default());
        let stale = session_at("asha", Utc::now() - TimeDelta::hours(25));
        accounts.storage.save_user_session(&stale).unwrap();

        assert!(!accounts.is_authenticated().unwrap());
        assert!(accounts.auth().unwrap().is_none());
    }

    #[test]
    fn test_recent_session_is_live() {
        let accounts = sync(FakeAccounts::default());
        let recent = session_at("asha", Utc::now() - TimeDelta::hours(23));
        accounts.storage.save_user_session(&recent).unwrap();

        assert!(accounts.is_authenticated().unwrap());
        assert!(accounts.auth().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_profile_falls_back_to_cached_profile() {
        let accounts = sync(FakeAccounts::down());
        accounts
            .storage
            .save_user_session(&session_at("asha", Utc::now()))
            .unwrap();

        let own = accounts.get_profile(&Username::new("asha")).await.unwrap();
        assert!(own.is_local());

        let other = accounts.get_profile(&Username::new("ravi")).await;
        assert!(matches!(other, Err(SyncError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_get_unknown_profile_is_not_found() {
        let accounts = sync(FakeAccounts::default());
        assert!(matches!(
            accounts.get_profile(&Username::new("ghost")).await,
            Err(SyncError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_session() {
        let accounts = sync(FakeAccounts::with_user("asha", "long-enough"));
        let asha = Username::new("asha");
        accounts.login(&asha, "long-enough").await.unwrap();

        let update = ProfileUpdate {
            delivery_address: Some("12 MG Road, Bengaluru".to_owned()),
            ..ProfileUpdate::default()
        };
        let updated = accounts.update_profile(&asha, update).await.unwrap();

        assert!(updated.is_remote());
        assert_eq!(
            accounts.current_user().unwrap().unwrap().delivery_address,
            "12 MG Road, Bengaluru"
        );
    }

    #[tokio::test]
    async fn test_offline_update_applies_to_cached_profile_except_passwords() {
        let accounts = sync(FakeAccounts::down());
        let asha = Username::new("asha");
        accounts
            .storage
            .save_user_session(&session_at("asha", Utc::now()))
            .unwrap();

        let update = ProfileUpdate {
            phone_number: Some("+91 98450 00000".to_owned()),
            ..ProfileUpdate::default()
        };
        let updated = accounts.update_profile(&asha, update).await.unwrap();
        assert!(updated.is_local());
        assert_eq!(
            accounts.current_user().unwrap().unwrap().phone_number,
            "+91 98450 00000"
        );

        let password_change = ProfileUpdate {
            password: Some("another-long-one".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            accounts.update_profile(&asha, password_change).await,
            Err(SyncError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_listing_and_delete() {
        let accounts = sync(FakeAccounts::with_user("asha", "long-enough"));
        assert_eq!(accounts.get_all_users().await.unwrap().len(), 1);

        accounts.delete_user(&Username::new("asha")).await.unwrap();
        assert!(accounts.get_all_users().await.unwrap().is_empty());
        assert!(matches!(
            accounts.delete_user(&Username::new("asha")).await,
            Err(SyncError::NotFound(_))
        ));
    }
}
