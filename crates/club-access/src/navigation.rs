//! Navigation resolver
//!
//! State machine over `{Unauthenticated, Loading, Authenticated(role, active)}`.
//! The active section is always a member of the role's allowed set: requests
//! for other sections leave the state untouched.

use crate::policy::{menu_for, permissions_for, MenuItem};
use crate::types::{Role, Section};
use serde::Serialize;

/// Navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    /// No session; only the sign-in view renders
    #[default]
    Unauthenticated,
    /// Identity known, profile still loading; rendering is suspended
    Loading,
    /// Session with a resolved profile
    Authenticated {
        /// Role of the signed-in profile
        role: Role,
        /// Section currently rendered
        active: Section,
    },
}

/// Landing section of a role
#[inline]
#[must_use]
pub fn default_section(role: Role) -> Section {
    permissions_for(role)
        .default_section
        .unwrap_or(Section::Dashboard)
}

/// Section to render for `requested`
///
/// Always a member of the role's allowed set: `requested` when allowed,
/// otherwise the role's default section.
#[must_use]
pub fn resolve(role: Role, requested: Section) -> Section {
    if permissions_for(role).allows(requested) {
        requested
    } else {
        default_section(role)
    }
}

/// What the shell should render right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    /// Sign-in form
    SignIn,
    /// Loading indicator; nothing role-dependent renders
    Suspended,
    /// A section with its sidebar menu
    Section {
        /// Active section
        section: Section,
        /// Header title
        title: &'static str,
        /// Ordered menu for the role
        menu: Vec<MenuItem>,
    },
}

/// Navigation state machine for one client session
#[derive(Debug, Default)]
pub struct Navigator {
    state: NavState,
}

impl Navigator {
    /// Create navigator in `Unauthenticated`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> NavState {
        self.state
    }

    /// Active section, when authenticated
    #[must_use]
    pub fn active_section(&self) -> Option<Section> {
        match self.state {
            NavState::Authenticated { active, .. } => Some(active),
            _ => None,
        }
    }

    /// Role bound to the current state, when authenticated
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self.state {
            NavState::Authenticated { role, .. } => Some(role),
            _ => None,
        }
    }

    /// Enter `Loading`: a profile fetch is in flight
    pub fn suspend(&mut self) {
        self.transition(NavState::Loading);
    }

    /// Bind a resolved profile role
    ///
    /// Entering from any other state lands on the role's default section.
    /// Re-binding the same role keeps the active section.
    pub fn authenticate(&mut self, role: Role) -> Section {
        if let NavState::Authenticated { role: current, active } = self.state {
            if current == role {
                return active;
            }
        }
        let landing = default_section(role);
        self.transition(NavState::Authenticated {
            role,
            active: landing,
        });
        landing
    }

    /// Drop back to `Unauthenticated` (sign-out or expiry)
    pub fn sign_out(&mut self) {
        self.transition(NavState::Unauthenticated);
    }

    /// Request `requested`
    ///
    /// Returns the active section after the request, or `None` when not
    /// authenticated. A disallowed request is a no-op.
    pub fn navigate(&mut self, requested: Section) -> Option<Section> {
        let NavState::Authenticated { role, active } = self.state else {
            tracing::debug!(section = %requested, "navigation ignored without session");
            return None;
        };
        if !permissions_for(role).allows(requested) {
            tracing::debug!(%role, section = %requested, "navigation to disallowed section ignored");
            return Some(active);
        }
        self.transition(NavState::Authenticated {
            role,
            active: requested,
        });
        Some(requested)
    }

    /// Request a section by tag
    ///
    /// Unknown tags redirect to the role's default section.
    pub fn navigate_tag(&mut self, tag: &str) -> Option<Section> {
        match tag.parse::<Section>() {
            Ok(section) => self.navigate(section),
            Err(err) => {
                tracing::debug!(error = %err, "redirecting to default section");
                let role = self.role()?;
                self.navigate(default_section(role))
            }
        }
    }

    /// View for the current state
    #[must_use]
    pub fn view(&self) -> View {
        match self.state {
            NavState::Unauthenticated => View::SignIn,
            NavState::Loading => View::Suspended,
            NavState::Authenticated { role, active } => View::Section {
                section: active,
                title: active.title(),
                menu: menu_for(role),
            },
        }
    }

    fn transition(&mut self, next: NavState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "navigation transition");
        }
        self.state = next;
    }
}
