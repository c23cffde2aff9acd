//! Session configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! log_filter = "club_session=debug"
//!
//! [session]
//! profile_fetch_timeout_ms = 3000
//! auth_event_buffer = 32
//! credential_mode = "strict"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// How the in-memory auth backend checks passwords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// Any password signs in (demo directory behavior)
    #[default]
    Open,
    /// Passwords must match the stored credential
    Strict,
}

/// Session provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on one profile fetch
    pub profile_fetch_timeout_ms: u64,
    /// Capacity of the auth-change broadcast channel
    pub auth_event_buffer: usize,
    /// Password checking of the in-memory backend
    pub credential_mode: CredentialMode,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With profile fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.profile_fetch_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With credential mode
    #[inline]
    #[must_use]
    pub fn with_credential_mode(mut self, mode: CredentialMode) -> Self {
        self.credential_mode = mode;
        self
    }

    /// Profile fetch timeout as a `Duration`
    #[inline]
    #[must_use]
    pub fn profile_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_fetch_timeout_ms)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for a zero timeout or zero buffer
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile_fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "profile_fetch_timeout_ms",
                reason: "must be greater than zero",
            });
        }
        if self.auth_event_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "auth_event_buffer",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_fetch_timeout_ms: 5_000,
            auth_event_buffer: 16,
            credential_mode: CredentialMode::Open,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    /// Tracing filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Session settings
    pub session: SessionConfig,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl ClubConfig {
    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.session.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` when the file cannot be read
    /// - see [`ClubConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ClubConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClubConfig::default());
        assert_eq!(config.session.profile_fetch_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_session_table() {
        let config = ClubConfig::from_toml_str(
            r#"
            [session]
            credential_mode = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.credential_mode, CredentialMode::Strict);
        assert_eq!(config.session.auth_event_buffer, 16);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ClubConfig::from_toml_str("[session]\nprofile_fetch_timeout_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "profile_fetch_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn unknown_mode_is_parse_error() {
        let err = ClubConfig::from_toml_str("[session]\ncredential_mode = \"lenient\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builder_setters() {
        let config = SessionConfig::new()
            .with_fetch_timeout(Duration::from_millis(250))
            .with_credential_mode(CredentialMode::Strict);
        assert_eq!(config.profile_fetch_timeout_ms, 250);
        assert!(config.validate().is_ok());
    }
}
