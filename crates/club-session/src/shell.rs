//! Application shell
//!
//! Wires the navigator to the session provider. The binding subscribes ahead
//! of every other observer, so the navigator has already left any stale role
//! behind when the rest of the application learns about a session change.

use crate::observer::SessionObserver;
use crate::provider::{SessionProvider, SessionState};
use crate::teams::{ScopedTeams, TeamAccessError, TeamStore};
use club_access::{NavState, Navigator, Section, View};
use parking_lot::Mutex;
use std::sync::Arc;

/// Navigator driven by session changes
#[derive(Debug, Default)]
pub struct NavigationBinding {
    navigator: Mutex<Navigator>,
}

impl NavigationBinding {
    /// Create binding in `Unauthenticated`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current navigation state
    #[must_use]
    pub fn state(&self) -> NavState {
        self.navigator.lock().state()
    }

    /// Request a section; see [`Navigator::navigate`]
    pub fn navigate(&self, section: Section) -> Option<Section> {
        self.navigator.lock().navigate(section)
    }

    /// Request a section by tag; see [`Navigator::navigate_tag`]
    pub fn navigate_tag(&self, tag: &str) -> Option<Section> {
        self.navigator.lock().navigate_tag(tag)
    }

    /// View to render
    #[must_use]
    pub fn view(&self) -> View {
        self.navigator.lock().view()
    }
}

impl SessionObserver for NavigationBinding {
    fn on_session_change(&self, state: &SessionState) {
        let mut navigator = self.navigator.lock();
        match state {
            SessionState::Unauthenticated => navigator.sign_out(),
            SessionState::Loading => navigator.suspend(),
            SessionState::Authenticated(session) => {
                navigator.authenticate(session.profile.role);
            }
        }
    }
}

/// Session provider plus navigation, as one client sees them
#[derive(Debug, Clone)]
pub struct ClubShell {
    provider: Arc<SessionProvider>,
    navigation: Arc<NavigationBinding>,
}

impl ClubShell {
    /// Attach a navigator to `provider`
    #[must_use]
    pub fn new(provider: Arc<SessionProvider>) -> Self {
        let navigation = Arc::new(NavigationBinding::new());
        provider.subscribe_first(Arc::clone(&navigation) as Arc<dyn SessionObserver>);
        // Catch up with a session that predates the shell
        navigation.on_session_change(&provider.state());
        Self {
            provider,
            navigation,
        }
    }

    /// Session provider
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &Arc<SessionProvider> {
        &self.provider
    }

    /// Navigation binding
    #[inline]
    #[must_use]
    pub fn navigation(&self) -> &Arc<NavigationBinding> {
        &self.navigation
    }

    /// Request a section
    pub fn navigate(&self, section: Section) -> Option<Section> {
        self.navigation.navigate(section)
    }

    /// Request a section by tag
    pub fn navigate_tag(&self, tag: &str) -> Option<Section> {
        self.navigation.navigate_tag(tag)
    }

    /// View to render
    ///
    /// Re-checks session expiry first, so an expired session renders the
    /// sign-in view even without a backend push.
    #[must_use]
    pub fn view(&self) -> View {
        self.provider.expire_if_stale();
        self.navigation.view()
    }

    /// Guarded team access for whoever is signed in
    ///
    /// The handle re-reads the session on every call; after a sign-out it
    /// fails with `TeamAccessError::Unauthenticated`.
    ///
    /// # Errors
    /// - `TeamAccessError::Unauthenticated` without a session
    pub fn teams(&self, store: Arc<dyn TeamStore>) -> Result<ScopedTeams, TeamAccessError> {
        if self.provider.current_profile().is_none() {
            return Err(TeamAccessError::Unauthenticated);
        }
        Ok(ScopedTeams::for_session(store, Arc::clone(&self.provider)))
    }
}
