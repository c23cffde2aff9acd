//! Core types for the access core
//!
//! Defines the fundamental vocabulary:
//! - Identifiers for identities, profiles and teams
//! - The closed role and section enumerations
//! - The club profile bound to an authenticated identity

use crate::error::{NavigationError, UnknownRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity id issued by the authentication backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl IdentityId {
    /// Wrap a backend identity id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Profile row id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl ProfileId {
    /// Wrap a profile id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Team id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    /// Wrap a team id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Actor type of a club profile
///
/// The set is closed: adding a role is a compile-time change that every
/// policy `match` has to acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Club administrator
    Admin,
    /// Team coach
    Coach,
    /// Team player
    Player,
    /// Sports coordinator across teams
    Coordinator,
    /// Parent or guardian of players
    Parent,
    /// Team director
    Director,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Coach,
        Role::Player,
        Role::Coordinator,
        Role::Parent,
        Role::Director,
    ];

    /// Lowercase tag as stored by the backend
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coach => "coach",
            Role::Player => "player",
            Role::Coordinator => "coordinator",
            Role::Parent => "parent",
            Role::Director => "director",
        }
    }

    /// Parse a backend tag; unknown tags yield `None`
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == tag)
    }

    /// Roles whose team access is not bounded by a team link
    #[inline]
    #[must_use]
    pub fn has_club_scope(self) -> bool {
        matches!(self, Role::Admin | Role::Coordinator)
    }

    /// Roles whose team access is bounded by their `team_id`
    #[inline]
    #[must_use]
    pub fn is_team_scoped(self) -> bool {
        matches!(self, Role::Coach | Role::Player | Role::Director)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Navigable area of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Landing statistics
    Dashboard,
    /// All club teams
    Teams,
    /// All club players
    Players,
    /// Exercise library
    Exercises,
    /// Training sessions
    Trainings,
    /// Matches, tournaments and meetings
    Events,
    /// Fees and payments
    Payments,
    /// Statistics
    Stats,
    /// Club settings
    Settings,
    /// The actor's own team
    Team,
    /// The actor's own profile
    Profile,
    /// Training attendance
    Attendance,
    /// A parent's children
    Children,
}

impl Section {
    /// Every section, in declaration order
    pub const ALL: [Section; 13] = [
        Section::Dashboard,
        Section::Teams,
        Section::Players,
        Section::Exercises,
        Section::Trainings,
        Section::Events,
        Section::Payments,
        Section::Stats,
        Section::Settings,
        Section::Team,
        Section::Profile,
        Section::Attendance,
        Section::Children,
    ];

    /// Lowercase tag used in navigation requests
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Teams => "teams",
            Section::Players => "players",
            Section::Exercises => "exercises",
            Section::Trainings => "trainings",
            Section::Events => "events",
            Section::Payments => "payments",
            Section::Stats => "stats",
            Section::Settings => "settings",
            Section::Team => "team",
            Section::Profile => "profile",
            Section::Attendance => "attendance",
            Section::Children => "children",
        }
    }

    /// Header title
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Teams => "Teams",
            Section::Players => "Players",
            Section::Exercises => "Exercises",
            Section::Trainings => "Trainings",
            Section::Events => "Events",
            Section::Payments => "Payments",
            Section::Stats => "Statistics",
            Section::Settings => "Settings",
            Section::Team => "My Team",
            Section::Profile => "My Profile",
            Section::Attendance => "Attendance",
            Section::Children => "My Children",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Section {
    type Err = NavigationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| NavigationError::UnknownSection(s.to_string()))
    }
}

/// Club profile bound to one authenticated identity
///
/// Fetched once per session and never mutated while the session lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile row id
    pub id: ProfileId,
    /// Identity this profile belongs to
    pub identity_id: IdentityId,
    /// Display name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// The single role of this profile
    pub role: Role,
    /// Team link, meaningful for coach, player and director
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// Parent link for players who are minors
    #[serde(default)]
    pub parent_id: Option<ProfileId>,
}

impl Profile {
    /// Create a profile without team or parent links
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        identity_id: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: ProfileId::new(id),
            identity_id: IdentityId::new(identity_id),
            full_name: full_name.into(),
            email: email.into(),
            role,
            team_id: None,
            parent_id: None,
        }
    }

    /// With team link
    #[inline]
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team_id = Some(TeamId::new(team));
        self
    }

    /// With parent link
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(ProfileId::new(parent));
        self
    }

    /// Uppercase initial of the display name, for avatars
    #[must_use]
    pub fn initial(&self) -> Option<char> {
        self.full_name
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
    }
}
