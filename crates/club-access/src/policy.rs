//! Role policy
//!
//! Static, total mapping from a role to the sections it may see. Pure: no
//! state, no I/O. Unknown role tags resolve to the empty permission set.

use crate::types::{Role, Section};
use serde::Serialize;

/// Sections a role may open, and where it lands after sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSet {
    /// Allowed sections, in menu order
    pub allowed_sections: &'static [Section],
    /// Landing section; `None` only for the empty set
    pub default_section: Option<Section>,
}

impl PermissionSet {
    /// The fail-closed set: nothing is visible
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            allowed_sections: &[],
            default_section: None,
        }
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn allows(&self, section: Section) -> bool {
        self.allowed_sections.contains(&section)
    }

    /// Check for the empty set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_sections.is_empty()
    }
}

const ADMIN: &[Section] = &[
    Section::Dashboard,
    Section::Teams,
    Section::Players,
    Section::Exercises,
    Section::Trainings,
    Section::Events,
    Section::Payments,
    Section::Stats,
    Section::Settings,
];

const COACH: &[Section] = &[
    Section::Dashboard,
    Section::Team,
    Section::Exercises,
    Section::Trainings,
    Section::Attendance,
    Section::Events,
    Section::Stats,
];

const PLAYER: &[Section] = &[
    Section::Dashboard,
    Section::Profile,
    Section::Trainings,
    Section::Events,
    Section::Stats,
];

const COORDINATOR: &[Section] = &[
    Section::Dashboard,
    Section::Teams,
    Section::Players,
    Section::Exercises,
    Section::Trainings,
    Section::Events,
    Section::Stats,
];

const PARENT: &[Section] = &[
    Section::Dashboard,
    Section::Children,
    Section::Events,
    Section::Payments,
];

const DIRECTOR: &[Section] = &[
    Section::Dashboard,
    Section::Team,
    Section::Exercises,
    Section::Trainings,
    Section::Events,
    Section::Payments,
    Section::Stats,
];

/// Permission set of a role
#[must_use]
pub fn permissions_for(role: Role) -> PermissionSet {
    let allowed_sections = match role {
        Role::Admin => ADMIN,
        Role::Coach => COACH,
        Role::Player => PLAYER,
        Role::Coordinator => COORDINATOR,
        Role::Parent => PARENT,
        Role::Director => DIRECTOR,
    };
    PermissionSet {
        allowed_sections,
        default_section: Some(Section::Dashboard),
    }
}

/// Permission set of a raw backend role tag
///
/// Tags outside the closed role set fail closed.
#[must_use]
pub fn permissions_for_tag(tag: &str) -> PermissionSet {
    Role::from_tag(tag).map_or_else(PermissionSet::empty, permissions_for)
}

/// Whether `role` matches any of `required`
#[inline]
#[must_use]
pub fn has_role(role: Role, required: &[Role]) -> bool {
    required.contains(&role)
}

/// Sidebar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Target section
    pub section: Section,
    /// Label shown for this role
    pub label: &'static str,
}

/// Menu label of `section` as seen by `role`
#[must_use]
pub fn label_for(role: Role, section: Section) -> &'static str {
    match (role, section) {
        (Role::Player, Section::Stats) => "My Stats",
        _ => section.title(),
    }
}

/// Ordered sidebar menu for a role
#[must_use]
pub fn menu_for(role: Role) -> Vec<MenuItem> {
    permissions_for(role)
        .allowed_sections
        .iter()
        .map(|&section| MenuItem {
            section,
            label: label_for(role, section),
        })
        .collect()
}
