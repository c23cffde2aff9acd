//! Club Access - role policy and navigation core
//!
//! The pure half of the club manager's access model:
//! - Maps each role to the sections it may open
//! - Drives the navigation state machine so restricted sections never render
//! - Guards team-scoped operations by role and team link
//!
//! # Example
//!
//! ```rust
//! use club_access::{can_access, resolve, Navigator, Profile, Role, Section, TeamId};
//!
//! let coach = Profile::new("p-2", "2", "Maria", "coach@club.test", Role::Coach)
//!     .with_team("team-1");
//!
//! let mut nav = Navigator::new();
//! nav.authenticate(coach.role);
//! assert_eq!(nav.navigate(Section::Payments), Some(Section::Dashboard));
//! assert_eq!(resolve(coach.role, Section::Payments), Section::Dashboard);
//!
//! assert!(can_access(&coach, &TeamId::new("team-1")));
//! assert!(!can_access(&coach, &TeamId::new("team-2")));
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod guard;
pub mod navigation;
pub mod policy;
pub mod types;

// Re-exports for convenience
pub use error::{AuthError, AuthorizationError, NavigationError, UnknownRole};
pub use guard::{authorize, can_access, TeamScope};
pub use navigation::{default_section, resolve, NavState, Navigator, View};
pub use policy::{
    has_role, label_for, menu_for, permissions_for, permissions_for_tag, MenuItem, PermissionSet,
};
pub use types::{IdentityId, Profile, ProfileId, Role, Section, TeamId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the access core
    pub use crate::{
        can_access, permissions_for, resolve, AuthError, AuthorizationError, Navigator, Profile,
        Role, Section, TeamId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
