//! In-memory collaborators
//!
//! A self-contained stand-in for the hosted auth service and profile table,
//! seeded with one demo account per role. Used by the CLI and by tests.

use crate::backend::{
    AuthBackend, AuthChange, BackendError, Identity, ProfileStore, SessionToken, SignUpRequest,
};
use crate::config::{CredentialMode, SessionConfig};
use async_trait::async_trait;
use chrono::Utc;
use club_access::{IdentityId, Profile, Role};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Password shared by every seeded demo account
pub const DEMO_PASSWORD: &str = "club-demo";

#[derive(Debug, Clone)]
struct Account {
    identity_id: IdentityId,
    password: String,
}

/// In-memory auth backend and profile store
#[derive(Debug)]
pub struct MemoryDirectory {
    mode: CredentialMode,
    accounts: RwLock<HashMap<String, Account>>,
    profiles: RwLock<HashMap<IdentityId, Profile>>,
    current: RwLock<Option<Identity>>,
    changes: broadcast::Sender<AuthChange>,
    session_ttl: Option<chrono::Duration>,
    sign_in_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
    available: AtomicBool,
}

impl MemoryDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new(mode: CredentialMode, event_buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(event_buffer.max(1));
        Self {
            mode,
            accounts: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            changes,
            session_ttl: None,
            sign_in_delay: None,
            fetch_delay: None,
            available: AtomicBool::new(true),
        }
    }

    /// Empty directory configured from session settings
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.credential_mode, config.auth_event_buffer)
    }

    /// Directory seeded with one account per role
    ///
    /// Coach, player and director are linked to `team-1`; every account
    /// uses [`DEMO_PASSWORD`].
    #[must_use]
    pub fn demo(config: &SessionConfig) -> Self {
        let directory = Self::from_config(config);
        for profile in demo_profiles() {
            directory.insert(profile, DEMO_PASSWORD);
        }
        directory
    }

    /// With session lifetime for issued identities
    #[inline]
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// With simulated sign-in latency
    #[inline]
    #[must_use]
    pub fn with_sign_in_delay(mut self, delay: Duration) -> Self {
        self.sign_in_delay = Some(delay);
        self
    }

    /// With simulated profile fetch latency
    #[inline]
    #[must_use]
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Register an account and its profile
    pub fn insert(&self, profile: Profile, password: &str) {
        let account = Account {
            identity_id: profile.identity_id.clone(),
            password: password.to_string(),
        };
        self.accounts
            .write()
            .insert(profile.email.to_lowercase(), account);
        self.profiles
            .write()
            .insert(profile.identity_id.clone(), profile);
    }

    /// Simulate an outage: every call fails with `Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Push an auth change as if it came from another client
    pub fn push_change(&self, change: AuthChange) {
        *self.current.write() = match &change {
            AuthChange::SignedIn(identity) => Some(identity.clone()),
            AuthChange::SignedOut | AuthChange::Expired => None,
        };
        // No receivers is fine
        let _ = self.changes.send(change);
    }

    /// Number of registered accounts
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("directory offline".to_string()))
        }
    }

    fn issue(&self, identity_id: IdentityId, email: &str) -> Identity {
        let identity = Identity {
            id: identity_id,
            email: email.to_string(),
            token: SessionToken(Uuid::new_v4().simple().to_string()),
            expires_at: self.session_ttl.map(|ttl| Utc::now() + ttl),
        };
        *self.current.write() = Some(identity.clone());
        let _ = self.changes.send(AuthChange::SignedIn(identity.clone()));
        identity
    }
}

#[async_trait]
impl AuthBackend for MemoryDirectory {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, BackendError> {
        if let Some(delay) = self.sign_in_delay {
            tokio::time::sleep(delay).await;
        }
        self.ensure_available()?;

        let email = email.trim().to_lowercase();
        let account = self.accounts.read().get(&email).cloned();
        let identity_id = match (self.mode, account) {
            (CredentialMode::Strict, Some(account)) if account.password == password => {
                account.identity_id
            }
            (CredentialMode::Strict, _) => return Err(BackendError::InvalidCredentials),
            (CredentialMode::Open, Some(account)) => account.identity_id,
            // Open mode authenticates anyone; the profile lookup decides
            (CredentialMode::Open, None) => IdentityId::new(Uuid::new_v4().to_string()),
        };
        Ok(self.issue(identity_id, &email))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<Identity, BackendError> {
        self.ensure_available()?;
        let email = request.email.trim().to_lowercase();
        if self.accounts.read().contains_key(&email) {
            return Err(BackendError::AlreadyExists(email));
        }

        let identity_id = Uuid::new_v4().to_string();
        let profile = Profile::new(
            format!("p-{identity_id}"),
            identity_id.clone(),
            request.full_name.clone(),
            email.clone(),
            request.role,
        );
        self.insert(profile, &request.password);
        Ok(self.issue(IdentityId::new(identity_id), &email))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let had_session = self.current.write().take().is_some();
        if had_session {
            let _ = self.changes.send(AuthChange::SignedOut);
        }
        Ok(())
    }

    async fn current_session(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl ProfileStore for MemoryDirectory {
    async fn fetch_profile(&self, identity: &IdentityId) -> Result<Profile, BackendError> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.ensure_available()?;
        self.profiles
            .read()
            .get(identity)
            .cloned()
            .ok_or(BackendError::NotFound)
    }
}

/// One profile per role, as seeded by [`MemoryDirectory::demo`]
#[must_use]
pub fn demo_profiles() -> Vec<Profile> {
    vec![
        Profile::new("p-1", "1", "John Admin", "admin@club.test", Role::Admin),
        Profile::new("p-2", "2", "Maria Coach", "coach@club.test", Role::Coach).with_team("team-1"),
        Profile::new("p-3", "3", "Peter Player", "player@club.test", Role::Player)
            .with_team("team-1")
            .with_parent("p-5"),
        Profile::new("p-4", "4", "Ana Coordinator", "coordinator@club.test", Role::Coordinator),
        Profile::new("p-5", "5", "Carlos Parent", "parent@club.test", Role::Parent),
        Profile::new("p-6", "6", "Sofia Director", "director@club.test", Role::Director)
            .with_team("team-1"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_mode_accepts_any_password() {
        let dir = MemoryDirectory::demo(&SessionConfig::default());
        let identity = dir
            .sign_in_with_password("Coach@Club.test", "whatever")
            .await
            .unwrap();
        assert_eq!(identity.id, IdentityId::new("2"));
        assert_eq!(dir.current_session().await, Some(identity));
    }

    #[tokio::test]
    async fn open_mode_unknown_email_has_no_profile() {
        let dir = MemoryDirectory::demo(&SessionConfig::default());
        let identity = dir.sign_in_with_password("ghost@club.test", "x").await.unwrap();
        assert_eq!(dir.fetch_profile(&identity.id).await, Err(BackendError::NotFound));
    }

    #[tokio::test]
    async fn strict_mode_checks_password() {
        let config = SessionConfig::new().with_credential_mode(CredentialMode::Strict);
        let dir = MemoryDirectory::demo(&config);

        let wrong = dir.sign_in_with_password("admin@club.test", "nope").await;
        assert_eq!(wrong, Err(BackendError::InvalidCredentials));

        let ok = dir.sign_in_with_password("admin@club.test", DEMO_PASSWORD).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn sign_up_creates_profile() {
        let dir = MemoryDirectory::new(CredentialMode::Strict, 4);
        let req = SignUpRequest::new("new@club.test", "pw", "New Member");
        let identity = dir.sign_up(&req).await.unwrap();

        let profile = dir.fetch_profile(&identity.id).await.unwrap();
        assert_eq!(profile.role, Role::Player);
        assert_eq!(profile.full_name, "New Member");

        let again = dir.sign_up(&req).await;
        assert!(matches!(again, Err(BackendError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn sign_out_broadcasts_once() {
        let dir = MemoryDirectory::demo(&SessionConfig::default());
        let mut rx = dir.subscribe();
        dir.sign_in_with_password("parent@club.test", "x").await.unwrap();
        dir.sign_out().await.unwrap();
        dir.sign_out().await.unwrap();

        assert!(matches!(rx.recv().await, Ok(AuthChange::SignedIn(_))));
        assert_eq!(rx.recv().await, Ok(AuthChange::SignedOut));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let dir = MemoryDirectory::demo(&SessionConfig::default());
        dir.set_available(false);
        let err = dir.fetch_profile(&IdentityId::new("1")).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
