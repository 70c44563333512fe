//! core::config::schema
//!
//! Configuration schema types.
//!
//! # File Layout
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8080"
//! api_key = "default-api-key"
//! timeout_secs = 30
//! priority = "UserInteractive"
//! ```
//!
//! Every field is optional; accessors on [`Config`](super::Config) apply
//! defaults. Unknown keys are rejected so typos surface immediately.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::api::Priority;

/// Keys accepted by `sso config get/set`.
pub const KEYS: &[&str] = &[
    "server.base_url",
    "server.api_key",
    "server.timeout_secs",
    "server.priority",
];

/// Contents of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Automation server connection settings
    pub server: Option<ServerConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.server {
            Some(server) => server.validate(),
            None => Ok(()),
        }
    }

    /// Read a single value by dotted key.
    ///
    /// Returns `Ok(None)` for a known key with no value set.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        check_key(key)?;
        let server = match &self.server {
            Some(s) => s,
            None => return Ok(None),
        };
        Ok(match key {
            "server.base_url" => server.base_url.clone(),
            "server.api_key" => server.api_key.clone(),
            "server.timeout_secs" => server.timeout_secs.map(|t| t.to_string()),
            "server.priority" => server.priority.map(|p| p.to_string()),
            _ => None,
        })
    }

    /// Set a single value by dotted key, parsing and validating it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        check_key(key)?;
        let server = self.server.get_or_insert_with(ServerConfig::default);
        match key {
            "server.base_url" => server.base_url = Some(value.to_string()),
            "server.api_key" => server.api_key = Some(value.to_string()),
            "server.timeout_secs" => server.timeout_secs = Some(parse_timeout(value)?),
            "server.priority" => {
                server.priority = Some(value.parse().map_err(ConfigError::InvalidValue)?)
            }
            _ => {}
        }
        server.validate()
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if KEYS.contains(&key) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "unknown key '{}', must be one of: {}",
            key,
            KEYS.join(", ")
        )))
    }
}

/// Parse a timeout in whole seconds.
pub fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue(format!(
            "invalid timeout '{}', expected whole seconds",
            value
        ))
    })
}

/// Automation server connection settings.
///
/// Also used for the environment and command-line override layers, where
/// `None` means "not overridden".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Base URL of the automation server
    pub base_url: Option<String>,

    /// Key sent in the `X-Api-Key` header
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Priority attached to submitted operations
    pub priority: Option<Priority>,
}

impl ServerConfig {
    /// Validate the values that are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid base URL '{}', must start with http:// or https://",
                    url
                )));
            }
        }

        if let Some(key) = &self.api_key {
            if key.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "api key cannot be empty".to_string(),
                ));
            }
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merged(&self, other: &ServerConfig) -> ServerConfig {
        ServerConfig {
            base_url: other.base_url.clone().or_else(|| self.base_url.clone()),
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            priority: other.priority.or(self.priority),
        }
    }
}
