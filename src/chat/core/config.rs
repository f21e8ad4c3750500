//! Configuration for the chat subsystem.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::core::errors::{ChatError, ChatResult};

/// Top-level configuration for the chat engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Remote API settings.
    pub api: ApiConfig,
    /// Durable storage settings.
    pub storage: StorageConfig,
    /// Session settings.
    pub session: SessionConfig,
}

impl ChatConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        Url::parse(&self.api.base_url)?;

        if self.api.timeout.is_zero() {
            return Err(ChatError::InvalidConfig(
                "api.timeout must be > 0".to_string(),
            ));
        }

        if self.session.logout_delay.is_zero() {
            return Err(ChatError::InvalidConfig(
                "session.logout_delay must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Remote API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the chat backend, including the API prefix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Durable storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the `SQLite` database file backing the key-value store.
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("palaver.db"),
        }
    }
}

/// Session settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay between surfacing a session-expired notice and the forced
    /// logout, so the user can read the notice.
    pub logout_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            logout_delay: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChatConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_base_url() {
        let mut config = ChatConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = ChatConfig::default();
        config.api.timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ChatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_logout_delay() {
        let mut config = ChatConfig::default();
        config.session.logout_delay = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ChatError::InvalidConfig(_))
        ));
    }
}
