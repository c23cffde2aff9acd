//! Team-scope guard
//!
//! Decides whether an actor may read or write a team's records. Callers must
//! consult it before any team-scoped operation and surface a denial as
//! [`AuthorizationError::Forbidden`], never as "not found".

use crate::error::AuthorizationError;
use crate::types::{Profile, TeamId};

/// The teams an actor reaches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamScope {
    /// Every team in the club
    Club,
    /// Exactly one linked team
    Team(TeamId),
    /// No team at all
    Nothing,
}

impl TeamScope {
    /// Scope derived from role and team link
    #[must_use]
    pub fn of(profile: &Profile) -> Self {
        if profile.role.has_club_scope() {
            return TeamScope::Club;
        }
        match (&profile.team_id, profile.role.is_team_scoped()) {
            (Some(team), true) => TeamScope::Team(team.clone()),
            _ => TeamScope::Nothing,
        }
    }

    /// Check if the scope covers a team
    #[inline]
    #[must_use]
    pub fn covers(&self, team: &TeamId) -> bool {
        match self {
            TeamScope::Club => true,
            TeamScope::Team(own) => own == team,
            TeamScope::Nothing => false,
        }
    }
}

/// Whether `profile` may act on `target`
///
/// First match wins:
/// 1. admin, coordinator: always
/// 2. coach, player, director: when linked to `target`
/// 3. otherwise: never
#[inline]
#[must_use]
pub fn can_access(profile: &Profile, target: &TeamId) -> bool {
    TeamScope::of(profile).covers(target)
}

/// [`can_access`] as a `Result`, logging denials
///
/// # Errors
/// - `AuthorizationError::Forbidden` when the scope does not cover `target`
pub fn authorize(profile: &Profile, target: &TeamId) -> Result<(), AuthorizationError> {
    if can_access(profile, target) {
        return Ok(());
    }
    tracing::warn!(
        profile = %profile.id,
        role = %profile.role,
        team = %target,
        "team access denied"
    );
    Err(AuthorizationError::Forbidden {
        role: profile.role,
        team: target.clone(),
    })
}
