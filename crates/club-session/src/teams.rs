//! Team records behind the team-scope guard
//!
//! [`ScopedTeams`] is the only way the application reaches a [`TeamStore`]:
//! the guard runs before the store is called, so a denied operation has no
//! side effect and is reported as `Forbidden`, never as "not found".

use crate::backend::BackendError;
use crate::provider::SessionProvider;
use async_trait::async_trait;
use club_access::{authorize, AuthorizationError, Profile, TeamId, TeamScope};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Team category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamCategory {
    /// Men's team
    Masculine,
    /// Women's team
    Feminine,
}

/// Team record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team id
    pub id: TeamId,
    /// Display name
    pub name: String,
    /// Category
    pub category: TeamCategory,
    /// Age group label, e.g. "U15"
    pub age_group: String,
    /// Coach profile id
    #[serde(default)]
    pub coach_id: Option<String>,
    /// Season label, e.g. "2024/2025"
    pub season: String,
    /// Free text
    #[serde(default)]
    pub description: Option<String>,
}

impl Team {
    /// Create a team record
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: TeamCategory,
        age_group: impl Into<String>,
        season: impl Into<String>,
    ) -> Self {
        Self {
            id: TeamId::new(id),
            name: name.into(),
            category,
            age_group: age_group.into(),
            coach_id: None,
            season: season.into(),
            description: None,
        }
    }

    /// With coach
    #[inline]
    #[must_use]
    pub fn with_coach(mut self, coach: impl Into<String>) -> Self {
        self.coach_id = Some(coach.into());
        self
    }

    /// Case-insensitive match on name or age group
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.age_group.to_lowercase().contains(&term)
    }
}

/// Team table collaborator
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// All teams
    async fn list(&self) -> Result<Vec<Team>, BackendError>;

    /// One team
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, BackendError>;

    /// Insert or replace
    async fn save(&self, team: Team) -> Result<Team, BackendError>;

    /// Delete; returns whether a row was removed
    async fn delete(&self, id: &TeamId) -> Result<bool, BackendError>;
}

/// Team access errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamAccessError {
    /// No authenticated session
    #[error("not signed in")]
    Unauthenticated,

    /// Guard denied the operation
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    /// Team does not exist (only reported after the guard allowed access)
    #[error("team not found: {0}")]
    NotFound(TeamId),

    /// Team id already in use
    #[error("team already exists: {0}")]
    AlreadyExists(TeamId),

    /// Store failure
    #[error("team store failed: {0}")]
    Backend(#[from] BackendError),
}

/// Source of the profile a [`ScopedTeams`] handle acts as
pub trait ActorSource: Send + Sync {
    /// Profile to authorize as; `None` when nobody is signed in
    fn current_actor(&self) -> Option<Arc<Profile>>;
}

impl ActorSource for SessionProvider {
    fn current_actor(&self) -> Option<Arc<Profile>> {
        self.current_profile()
    }
}

impl ActorSource for Arc<Profile> {
    fn current_actor(&self) -> Option<Arc<Profile>> {
        Some(Arc::clone(self))
    }
}

/// Guarded view of a team store
///
/// The actor is resolved again on every call, so a handle kept across a
/// sign-out or a role change never acts with the old profile.
#[derive(Clone)]
pub struct ScopedTeams {
    store: Arc<dyn TeamStore>,
    actors: Arc<dyn ActorSource>,
}

impl std::fmt::Debug for ScopedTeams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTeams")
            .field("actor", &self.actors.current_actor().map(|p| p.id.clone()))
            .finish_non_exhaustive()
    }
}

impl ScopedTeams {
    /// Bind a store to an actor source
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn TeamStore>, actors: Arc<dyn ActorSource>) -> Self {
        Self { store, actors }
    }

    /// Act as whoever is signed in to `provider`
    #[must_use]
    pub fn for_session(store: Arc<dyn TeamStore>, provider: Arc<SessionProvider>) -> Self {
        Self::new(store, provider)
    }

    /// Act as a fixed profile
    #[must_use]
    pub fn for_profile(store: Arc<dyn TeamStore>, profile: Arc<Profile>) -> Self {
        Self::new(store, Arc::new(profile))
    }

    /// Profile the next call would act as
    #[inline]
    #[must_use]
    pub fn actor(&self) -> Option<Arc<Profile>> {
        self.actors.current_actor()
    }

    fn require_actor(&self) -> Result<Arc<Profile>, TeamAccessError> {
        self.actor().ok_or_else(|| {
            tracing::warn!("team access without a session");
            TeamAccessError::Unauthenticated
        })
    }

    /// Teams the actor can access, ordered by name
    ///
    /// `search` filters on name or age group, case-insensitively.
    ///
    /// # Errors
    /// - `TeamAccessError::Unauthenticated` when nobody is signed in
    /// - `TeamAccessError::Backend` on store failure
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Team>, TeamAccessError> {
        let scope = TeamScope::of(&*self.require_actor()?);
        if scope == TeamScope::Nothing {
            return Ok(Vec::new());
        }
        let mut teams: Vec<Team> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|team| scope.covers(&team.id))
            .filter(|team| search.map_or(true, |term| team.matches_search(term)))
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    /// One team
    ///
    /// # Errors
    /// - `TeamAccessError::Unauthenticated` when nobody is signed in
    /// - `TeamAccessError::Forbidden` before the store is touched
    /// - `TeamAccessError::NotFound` when an accessible id has no row
    pub async fn get(&self, id: &TeamId) -> Result<Team, TeamAccessError> {
        authorize(&*self.require_actor()?, id)?;
        self.store
            .get(id)
            .await?
            .ok_or_else(|| TeamAccessError::NotFound(id.clone()))
    }

    /// Create a team; only club-wide roles may create
    ///
    /// # Errors
    /// - `TeamAccessError::Unauthenticated` when nobody is signed in
    /// - `TeamAccessError::Forbidden` for team-scoped or unscoped roles
    /// - `TeamAccessError::AlreadyExists` when the id is taken
    pub async fn create(&self, team: Team) -> Result<Team, TeamAccessError> {
        let actor = self.require_actor()?;
        if !actor.role.has_club_scope() {
            tracing::warn!(role = %actor.role, team = %team.id, "team creation denied");
            return Err(AuthorizationError::Forbidden {
                role: actor.role,
                team: team.id,
            }
            .into());
        }
        if self.store.get(&team.id).await?.is_some() {
            return Err(TeamAccessError::AlreadyExists(team.id));
        }
        tracing::info!(actor = %actor.id, team = %team.id, "creating team");
        Ok(self.store.save(team).await?)
    }

    /// Update an existing team
    ///
    /// # Errors
    /// - `TeamAccessError::Unauthenticated` when nobody is signed in
    /// - `TeamAccessError::Forbidden` before the store is touched
    /// - `TeamAccessError::NotFound` when the team does not exist
    pub async fn update(&self, team: Team) -> Result<Team, TeamAccessError> {
        let actor = self.require_actor()?;
        authorize(&actor, &team.id)?;
        if self.store.get(&team.id).await?.is_none() {
            return Err(TeamAccessError::NotFound(team.id));
        }
        tracing::info!(actor = %actor.id, team = %team.id, "updating team");
        Ok(self.store.save(team).await?)
    }

    /// Delete a team
    ///
    /// # Errors
    /// - `TeamAccessError::Unauthenticated` when nobody is signed in
    /// - `TeamAccessError::Forbidden` before the store is touched
    /// - `TeamAccessError::NotFound` when nothing was deleted
    pub async fn delete(&self, id: &TeamId) -> Result<(), TeamAccessError> {
        let actor = self.require_actor()?;
        authorize(&actor, id)?;
        if !self.store.delete(id).await? {
            return Err(TeamAccessError::NotFound(id.clone()));
        }
        tracing::info!(actor = %actor.id, team = %id, "deleted team");
        Ok(())
    }
}

/// In-memory team table
#[derive(Debug, Default)]
pub struct MemoryTeams {
    teams: RwLock<BTreeMap<TeamId, Team>>,
}

impl MemoryTeams {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `teams`
    #[must_use]
    pub fn with_teams(teams: impl IntoIterator<Item = Team>) -> Self {
        let store = Self::new();
        {
            let mut map = store.teams.write();
            for team in teams {
                map.insert(team.id.clone(), team);
            }
        }
        store
    }

    /// Number of stored teams
    #[must_use]
    pub fn len(&self) -> usize {
        self.teams.read().len()
    }

    /// Check for an empty store
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.teams.read().is_empty()
    }
}

#[async_trait]
impl TeamStore for MemoryTeams {
    async fn list(&self) -> Result<Vec<Team>, BackendError> {
        Ok(self.teams.read().values().cloned().collect())
    }

    async fn get(&self, id: &TeamId) -> Result<Option<Team>, BackendError> {
        Ok(self.teams.read().get(id).cloned())
    }

    async fn save(&self, team: Team) -> Result<Team, BackendError> {
        self.teams.write().insert(team.id.clone(), team.clone());
        Ok(team)
    }

    async fn delete(&self, id: &TeamId) -> Result<bool, BackendError> {
        Ok(self.teams.write().remove(id).is_some())
    }
}

/// Teams seeded next to the demo directory
#[must_use]
pub fn demo_teams() -> Vec<Team> {
    vec![
        Team::new("team-1", "Seniors A", TeamCategory::Masculine, "Seniors - M", "2024/2025")
            .with_coach("p-2"),
        Team::new("team-2", "Juniors", TeamCategory::Feminine, "U18 - F", "2024/2025"),
        Team::new("team-3", "Cadets", TeamCategory::Masculine, "U16 - M", "2024/2025"),
    ]
}
