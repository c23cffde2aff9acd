//! Session provider
//!
//! Sole owner of the current identity and its profile. Every session change
//! goes through `advance`, which bumps an attempt
//! generation under the state lock; a sign-in only commits its result when its
//! generation is still current, so a later sign-in or a sign-out discards any
//! profile fetch that was in flight.

use crate::backend::{AuthBackend, AuthChange, Identity, ProfileStore, SignUpRequest};
use crate::config::SessionConfig;
use crate::observer::{ObserverId, ObserverList, SessionObserver};
use chrono::Utc;
use club_access::{has_role, AuthError, Profile, Role};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Authenticated identity with its resolved profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Backend identity
    pub identity: Identity,
    /// Profile bound to the identity
    pub profile: Arc<Profile>,
}

/// Session state observed by subscribers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is signed in
    #[default]
    Unauthenticated,
    /// A sign-in or profile fetch is in flight
    Loading,
    /// Identity and profile both resolved
    Authenticated(Session),
}

impl SessionState {
    /// Session, when authenticated
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Check for an authenticated session
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Role of the bound profile
    #[inline]
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| s.profile.role)
    }
}

/// Owner of the current session
pub struct SessionProvider {
    auth: Arc<dyn AuthBackend>,
    profiles: Arc<dyn ProfileStore>,
    config: SessionConfig,
    state: RwLock<SessionState>,
    generation: AtomicU64,
    last_error: RwLock<Option<AuthError>>,
    observers: Mutex<ObserverList>,
    delivery: ReentrantMutex<()>,
}

impl std::fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("observers", &self.observers.lock().len())
            .finish_non_exhaustive()
    }
}

impl SessionProvider {
    /// Create provider in `Unauthenticated`
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        profiles: Arc<dyn ProfileStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            auth,
            profiles,
            config,
            state: RwLock::new(SessionState::Unauthenticated),
            generation: AtomicU64::new(0),
            last_error: RwLock::new(None),
            observers: Mutex::new(ObserverList::default()),
            delivery: ReentrantMutex::new(()),
        }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Append an observer
    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) -> ObserverId {
        self.observers.lock().push_back(observer)
    }

    /// Insert an observer ahead of every existing one
    ///
    /// Used by the navigation binding, which must see a change before any
    /// other component reads the new profile.
    pub fn subscribe_first(&self, observer: Arc<dyn SessionObserver>) -> ObserverId {
        self.observers.lock().push_front(observer)
    }

    /// Remove an observer; returns whether it was subscribed
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.lock().remove(id)
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Current authenticated pair, or `None`
    ///
    /// An identity past its expiry is cleared here and observers are told.
    #[must_use]
    pub fn get_session(&self) -> Option<Session> {
        let session = self.state.read().session().cloned()?;
        if self.expire(&session) {
            return None;
        }
        Some(session)
    }

    /// Clear the bound session if its identity has expired
    ///
    /// Returns whether a session was cleared.
    pub fn expire_if_stale(&self) -> bool {
        match self.state.read().session().cloned() {
            Some(session) => self.expire(&session),
            None => false,
        }
    }

    /// Profile of the current session
    #[must_use]
    pub fn current_profile(&self) -> Option<Arc<Profile>> {
        self.get_session().map(|s| s.profile)
    }

    /// Whether the current profile has any of `required`
    #[must_use]
    pub fn has_role(&self, required: &[Role]) -> bool {
        self.current_profile()
            .is_some_and(|p| has_role(p.role, required))
    }

    /// Failure of the most recent attempt, for display
    #[must_use]
    pub fn last_error(&self) -> Option<AuthError> {
        self.last_error.read().clone()
    }

    /// Sign in and bind the identity's profile
    ///
    /// # Errors
    /// - `AuthError::InvalidCredentials` when the backend rejects the credentials
    /// - `AuthError::ProfileNotFound` when the identity has no profile row
    /// - `AuthError::FetchFailed` on backend failure or fetch timeout
    /// - `AuthError::Superseded` when a later sign-in or sign-out won
    pub async fn sign_in(&self, email: &str, credential: &str) -> Result<Arc<Profile>, AuthError> {
        let ticket = self.begin_attempt();
        tracing::info!(email, "signing in");

        let identity = match self.auth.sign_in_with_password(email, credential).await {
            Ok(identity) => identity,
            Err(err) => return Err(self.reject(ticket, err.into_sign_in_error()).await),
        };
        self.bind_profile(ticket, identity).await
    }

    /// Register an account, then bind its profile as a sign-in would
    ///
    /// # Errors
    /// Same as [`SessionProvider::sign_in`]; an already registered email is
    /// `AuthError::InvalidCredentials`.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<Arc<Profile>, AuthError> {
        let ticket = self.begin_attempt();
        tracing::info!(email = %request.email, role = %request.role, "signing up");

        let identity = match self.auth.sign_up(request).await {
            Ok(identity) => identity,
            Err(err) => return Err(self.reject(ticket, err.into_sign_in_error()).await),
        };
        self.bind_profile(ticket, identity).await
    }

    /// Adopt a session the backend already holds
    ///
    /// Returns `Ok(None)` when the backend has no live identity.
    ///
    /// # Errors
    /// Profile resolution errors, as for [`SessionProvider::sign_in`]
    pub async fn restore(&self) -> Result<Option<Arc<Profile>>, AuthError> {
        let Some(identity) = self.auth.current_session().await else {
            return Ok(None);
        };
        if identity.is_expired_at(Utc::now()) {
            tracing::debug!(identity = %identity.id, "stored session already expired");
            return Ok(None);
        }
        let ticket = self.begin_attempt();
        self.bind_profile(ticket, identity).await.map(Some)
    }

    /// Clear the session
    ///
    /// Idempotent. Any profile fetch still in flight is discarded when it
    /// completes. A backend failure is logged; local state is cleared anyway.
    pub async fn sign_out(&self) {
        let (_, previous) = self.advance(SessionState::Unauthenticated);
        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "backend sign-out failed; local session cleared");
        }
        if previous != SessionState::Unauthenticated {
            tracing::info!("signed out");
            self.notify();
        }
    }

    /// Apply a change pushed by the auth backend
    ///
    /// The backend also echoes changes this provider caused, possibly after
    /// later local changes. Events are therefore checked against the
    /// backend's current session before they touch local state.
    pub async fn handle_auth_change(&self, change: AuthChange) {
        match change {
            AuthChange::SignedIn(identity) => {
                let expected = {
                    let state = self.state.read();
                    let adopt = match &*state {
                        // Our own attempt is in flight
                        SessionState::Loading => false,
                        SessionState::Authenticated(session) => session.identity.id != identity.id,
                        SessionState::Unauthenticated => true,
                    };
                    if !adopt {
                        return;
                    }
                    self.generation.load(Ordering::SeqCst)
                };

                let live = self.auth.current_session().await;
                let Some(live) = live.filter(|live| live.id == identity.id) else {
                    tracing::debug!(identity = %identity.id, "ignoring sign-in that is no longer live");
                    return;
                };
                let Some(ticket) = self.begin_adoption(expected) else {
                    tracing::debug!(identity = %identity.id, "session changed while checking backend");
                    return;
                };
                if let Err(err) = self.bind_profile(ticket, live).await {
                    tracing::warn!(error = %err, "could not adopt backend session");
                }
            }
            ended @ (AuthChange::SignedOut | AuthChange::Expired) => {
                let Some(bound) = self.state.read().session().cloned() else {
                    // Nothing bound, or a local attempt is loading
                    return;
                };
                let live = self.auth.current_session().await;
                if live.is_some_and(|live| live.id == bound.identity.id) {
                    tracing::debug!(change = ?ended, "backend still holds the bound identity");
                    return;
                }
                if self.clear_if_bound(&bound) {
                    tracing::info!(change = ?ended, "session ended by backend");
                }
            }
        }
    }

    /// Forward backend auth changes into [`SessionProvider::handle_auth_change`]
    ///
    /// The task ends when the backend drops its sender.
    pub fn spawn_auth_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.auth.subscribe();
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => provider.handle_auth_change(change).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth change stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Resolve the profile of `identity` and commit it if `ticket` is current
    async fn bind_profile(&self, ticket: u64, identity: Identity) -> Result<Arc<Profile>, AuthError> {
        if !self.is_current(ticket) {
            return Err(AuthError::Superseded);
        }

        let fetch = self.profiles.fetch_profile(&identity.id);
        let profile = match tokio::time::timeout(self.config.profile_fetch_timeout(), fetch).await {
            Ok(Ok(profile)) => profile,
            Ok(Err(err)) => return Err(self.reject(ticket, err.into_profile_error()).await),
            Err(_) => {
                let err = AuthError::FetchFailed("profile fetch timed out".to_string());
                return Err(self.reject(ticket, err).await);
            }
        };

        if profile.identity_id != identity.id {
            tracing::warn!(
                identity = %identity.id,
                profile_owner = %profile.identity_id,
                "profile store returned a row for another identity"
            );
            return Err(self.reject(ticket, AuthError::ProfileNotFound).await);
        }

        self.commit(ticket, identity, profile)
    }

    fn commit(&self, ticket: u64, identity: Identity, profile: Profile) -> Result<Arc<Profile>, AuthError> {
        let profile = Arc::new(profile);
        {
            let mut state = self.state.write();
            if !self.is_current(ticket) {
                tracing::debug!(identity = %identity.id, "discarding stale profile fetch");
                return Err(AuthError::Superseded);
            }
            tracing::info!(
                identity = %identity.id,
                role = %profile.role,
                "session established"
            );
            *state = SessionState::Authenticated(Session {
                identity,
                profile: Arc::clone(&profile),
            });
        }
        self.notify();
        Ok(profile)
    }

    /// Record a failure and end whatever session the backend still holds
    ///
    /// Stale attempts only learn they were superseded.
    async fn reject(&self, ticket: u64, err: AuthError) -> AuthError {
        {
            let mut state = self.state.write();
            if !self.is_current(ticket) {
                return AuthError::Superseded;
            }
            *state = SessionState::Unauthenticated;
            *self.last_error.write() = Some(err.clone());
        }
        tracing::warn!(error = %err, "sign-in failed");
        self.notify();

        // A newer attempt may already own the backend session
        if self.is_current(ticket) {
            if let Err(backend) = self.auth.sign_out().await {
                tracing::warn!(error = %backend, "backend sign-out after failed sign-in failed");
            }
        }
        err
    }

    fn begin_attempt(&self) -> u64 {
        *self.last_error.write() = None;
        let (ticket, _) = self.advance(SessionState::Loading);
        self.notify();
        ticket
    }

    /// Start adopting a backend session unless the state moved past `expected`
    fn begin_adoption(&self, expected: u64) -> Option<u64> {
        let ticket = {
            let mut state = self.state.write();
            if !self.is_current(expected) {
                return None;
            }
            *state = SessionState::Loading;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        *self.last_error.write() = None;
        self.notify();
        Some(ticket)
    }

    /// Replace the state and start a new generation
    fn advance(&self, next: SessionState) -> (u64, SessionState) {
        let mut state = self.state.write();
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = std::mem::replace(&mut *state, next);
        (ticket, previous)
    }

    fn expire(&self, session: &Session) -> bool {
        if !session.identity.is_expired_at(Utc::now()) {
            return false;
        }
        tracing::info!(identity = %session.identity.id, "session expired");
        self.clear_if_bound(session)
    }

    /// Drop `session` if it is still the bound one
    fn clear_if_bound(&self, session: &Session) -> bool {
        {
            let mut state = self.state.write();
            if state.session() != Some(session) {
                return false;
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::Unauthenticated;
        }
        self.notify();
        true
    }

    #[inline]
    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Deliver the current state to every observer, in order
    ///
    /// Deliveries are serialized, so the last one always carries the latest
    /// state. The lock is reentrant: observers may call back into the provider.
    fn notify(&self) {
        let _delivery = self.delivery.lock();
        let observers = self.observers.lock().snapshot();
        let state = self.state();
        for observer in observers {
            observer.on_session_change(&state);
        }
    }
}
