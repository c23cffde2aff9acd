//! Collaborator contracts
//!
//! The hosted auth service and the profile table are black boxes: the session
//! provider only relies on these traits and tolerates any latency or failure
//! behind them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_access::{AuthError, IdentityId, Profile, Role};
use std::fmt;
use tokio::sync::broadcast;

/// Opaque access token of an authenticated identity
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Authenticated identity as reported by the auth backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Identity id; keys the profile lookup
    pub id: IdentityId,
    /// Email used to sign in
    pub email: String,
    /// Access token
    pub token: SessionToken,
    /// Expiry instant, `None` for non-expiring sessions
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Check expiry against `now`
    #[inline]
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Auth state change pushed by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    /// An identity signed in
    SignedIn(Identity),
    /// The identity signed out
    SignedOut,
    /// The identity's token expired
    Expired,
}

/// Account creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
    /// Display name for the new profile
    pub full_name: String,
    /// Role of the new profile
    pub role: Role,
}

impl SignUpRequest {
    /// New request with the default `player` role
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            role: Role::Player,
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Credentials rejected
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Requested row does not exist
    #[error("not found")]
    NotFound,

    /// Account already registered
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Service unreachable or failing
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Classify a failure of the sign-in call
    #[must_use]
    pub fn into_sign_in_error(self) -> AuthError {
        match self {
            BackendError::InvalidCredentials | BackendError::AlreadyExists(_) => {
                AuthError::InvalidCredentials
            }
            BackendError::NotFound => AuthError::ProfileNotFound,
            BackendError::Unavailable(msg) => AuthError::FetchFailed(msg),
        }
    }

    /// Classify a failure of the profile fetch
    #[must_use]
    pub fn into_profile_error(self) -> AuthError {
        match self {
            BackendError::NotFound => AuthError::ProfileNotFound,
            other => AuthError::FetchFailed(other.to_string()),
        }
    }
}

/// Authentication collaborator
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange email and password for an identity
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, BackendError>;

    /// Register an account and sign it in
    async fn sign_up(&self, request: &SignUpRequest) -> Result<Identity, BackendError>;

    /// End the backend session
    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Identity the backend currently holds, if any
    async fn current_session(&self) -> Option<Identity>;

    /// Stream of auth state changes
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Profile table collaborator
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the single profile row of an identity
    async fn fetch_profile(&self, identity: &IdentityId) -> Result<Profile, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_debug_is_redacted() {
        let token = SessionToken("secret-token".to_string());
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn expiry_boundary() {
        let now = Utc::now();
        let identity = Identity {
            id: IdentityId::new("1"),
            email: "a@club.test".to_string(),
            token: SessionToken("t".to_string()),
            expires_at: Some(now),
        };
        assert!(identity.is_expired_at(now));
        assert!(!identity.is_expired_at(now - Duration::seconds(1)));

        let forever = Identity {
            expires_at: None,
            ..identity
        };
        assert!(!forever.is_expired_at(now + Duration::days(365)));
    }

    #[test]
    fn error_classification() {
        assert_eq!(
            BackendError::InvalidCredentials.into_sign_in_error(),
            AuthError::InvalidCredentials
        );
        assert_eq!(BackendError::NotFound.into_profile_error(), AuthError::ProfileNotFound);
        assert!(matches!(
            BackendError::Unavailable("down".to_string()).into_profile_error(),
            AuthError::FetchFailed(_)
        ));
    }

    #[test]
    fn sign_up_defaults_to_player() {
        let req = SignUpRequest::new("new@club.test", "pw", "New Member");
        assert_eq!(req.role, Role::Player);
        assert_eq!(req.with_role(Role::Parent).role, Role::Parent);
    }
}
