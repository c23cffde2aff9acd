//! Testing utilities for the club workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use club_access::{Profile, Role};
use club_session::{
    ClubShell, MemoryDirectory, SessionConfig, SessionObserver, SessionProvider, SessionState,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub use club_session::DEMO_PASSWORD;

/// Demo login email of a role
#[must_use]
pub fn demo_email(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin@club.test",
        Role::Coach => "coach@club.test",
        Role::Player => "player@club.test",
        Role::Coordinator => "coordinator@club.test",
        Role::Parent => "parent@club.test",
        Role::Director => "director@club.test",
    }
}

pub fn profile(role: Role) -> Profile {
    Profile::new("p-test", "u-test", "Test Member", "member@club.test", role)
}

pub fn team_profile(role: Role, team: &str) -> Profile {
    profile(role).with_team(team)
}

pub fn setup_provider(directory: MemoryDirectory, config: SessionConfig) -> Arc<SessionProvider> {
    let directory = Arc::new(directory);
    Arc::new(SessionProvider::new(directory.clone(), directory, config))
}

/// Provider over the seeded demo directory, with the directory handle
pub fn setup_demo() -> (Arc<MemoryDirectory>, Arc<SessionProvider>) {
    let config = SessionConfig::default();
    let directory = Arc::new(MemoryDirectory::demo(&config));
    let provider = Arc::new(SessionProvider::new(
        directory.clone(),
        directory.clone(),
        config,
    ));
    (directory, provider)
}

pub fn setup_demo_shell() -> (Arc<MemoryDirectory>, ClubShell) {
    let (directory, provider) = setup_demo();
    (directory, ClubShell::new(provider))
}

/// Coarse label of a session state, for compact assertions
#[must_use]
pub fn state_label(state: &SessionState) -> String {
    match state {
        SessionState::Unauthenticated => "unauthenticated".to_string(),
        SessionState::Loading => "loading".to_string(),
        SessionState::Authenticated(session) => format!("authenticated:{}", session.profile.role),
    }
}

/// Observer that records every state it is shown
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn labels(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.seen.lock().last().cloned()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_session_change(&self, state: &SessionState) {
        self.seen.lock().push(state_label(state));
    }
}
