//! Club Session - session provider and guarded data access
//!
//! The stateful half of the club manager's access model:
//! - Signs in through an injected auth backend and binds exactly one profile
//! - Discards profile fetches superseded by a newer sign-in or a sign-out
//! - Notifies observers, navigation first, on every session change
//! - Routes team reads and writes through the team-scope guard
//!
//! # Example
//!
//! ```rust,ignore
//! use club_session::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::default();
//! let directory = Arc::new(MemoryDirectory::demo(&config));
//! let provider = Arc::new(SessionProvider::new(directory.clone(), directory, config));
//! let shell = ClubShell::new(provider.clone());
//!
//! provider.sign_in("coach@club.test", "club-demo").await?;
//! shell.navigate(Section::Attendance);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod backend;
pub mod config;
pub mod memory;
pub mod observer;
pub mod provider;
pub mod shell;
pub mod teams;

// Re-exports for convenience
pub use backend::{
    AuthBackend, AuthChange, BackendError, Identity, ProfileStore, SessionToken, SignUpRequest,
};
pub use config::{ClubConfig, ConfigError, CredentialMode, SessionConfig};
pub use memory::{demo_profiles, MemoryDirectory, DEMO_PASSWORD};
pub use observer::{ObserverId, SessionObserver};
pub use provider::{Session, SessionProvider, SessionState};
pub use shell::{ClubShell, NavigationBinding};
pub use teams::{
    demo_teams, ActorSource, MemoryTeams, ScopedTeams, Team, TeamAccessError, TeamCategory,
    TeamStore,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with sessions
    pub use crate::{
        ClubShell, MemoryDirectory, MemoryTeams, SessionConfig, SessionObserver, SessionProvider,
        SessionState,
    };
    pub use club_access::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
