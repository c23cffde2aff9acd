//! Error types for the access core
//!
//! Provides the error taxonomy shared by every layer:
//! - Authentication and profile resolution failures
//! - Team-scope authorization denials
//! - Navigation requests for sections that do not exist

use crate::types::{Role, TeamId};

/// Authentication / profile resolution errors
///
/// None of these are fatal: the caller stays unauthenticated and may retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The authentication backend rejected the credentials
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The identity exists but has no profile row
    #[error("profile not found")]
    ProfileNotFound,

    /// Backend or network failure while signing in or fetching the profile
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// A later sign-in or sign-out replaced this attempt; its result was discarded
    #[error("sign-in superseded by a newer session change")]
    Superseded,
}

impl AuthError {
    /// Check if the attempt may be retried as-is
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::Superseded)
    }

    /// Message suitable for an inline form error
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Email or password is incorrect",
            Self::ProfileNotFound => "No club profile is registered for this account",
            Self::FetchFailed(_) => "Could not reach the club server, please try again",
            Self::Superseded => "Sign-in was replaced by a newer request",
        }
    }
}

/// Team-scope authorization errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    /// The actor's role and team link do not cover the target team
    #[error("{role} may not act on team {team}")]
    Forbidden {
        /// Role of the denied actor
        role: Role,
        /// Team the operation targeted
        team: TeamId,
    },
}

/// Navigation errors
///
/// Recovered silently by falling back to the role's default section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// The requested tag does not name any section
    #[error("unknown section: {0}")]
    UnknownSection(String),
}

/// Role tag that is not part of the closed role set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);
