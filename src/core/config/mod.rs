//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`API_BASE_URL`, `API_KEY`, `SSO_TIMEOUT_SECS`)
//! 4. CLI flags (`--base-url`, `--api-key`)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$SSO_CONFIG` if set (also where `config set` writes, even before the file exists)
//! 2. `$XDG_CONFIG_HOME/sso/config.toml`
//! 3. `~/.sso/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use sorting_operator::core::config::Config;
//!
//! let config = Config::load(None).unwrap().with_env(|k| std::env::var(k).ok()).unwrap();
//! println!("Server: {}", config.base_url());
//! println!("Timeout: {:?}", config.timeout());
//! ```

pub mod schema;

pub use schema::{FileConfig, ServerConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::api::Priority;

/// Default automation server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Key used when none is configured.
pub const DEFAULT_API_KEY: &str = "default-api-key";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Effective configuration: file contents plus override layers.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Contents of the config file (defaults if none was found)
    pub file: FileConfig,
    /// Values from the environment and command line
    overrides: ServerConfig,
    /// Path the file was loaded from
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// holds invalid values. A missing file is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], resolving locations through `lookup`.
    pub fn load_with<F>(explicit: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::locate(&lookup),
        };

        let file = match &path {
            Some(p) if p.exists() => Self::read_config(p)?,
            _ => FileConfig::default(),
        };
        file.validate()?;

        Ok(Config {
            file,
            overrides: ServerConfig::default(),
            path,
        })
    }

    /// Pick the config file: `$SSO_CONFIG` whenever it is set, otherwise
    /// the first existing default location.
    fn locate<F>(lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. $SSO_CONFIG, even if the file does not exist yet
        if let Some(path) = lookup("SSO_CONFIG").filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }

        // 2. $XDG_CONFIG_HOME/sso/config.toml
        if let Some(xdg_home) = lookup("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("sso/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.sso/config.toml
        let path = dirs::home_dir()?.join(".sso/config.toml");
        path.exists().then_some(path)
    }

    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let env = ServerConfig {
            base_url: get("API_BASE_URL"),
            api_key: get("API_KEY"),
            timeout_secs: get("SSO_TIMEOUT_SECS")
                .map(|v| schema::parse_timeout(&v))
                .transpose()?,
            priority: None,
        };
        env.validate()?;

        self.overrides = self.overrides.merged(&env);
        Ok(self)
    }

    /// Apply command-line overrides; they win over everything else.
    pub fn with_flags(
        mut self,
        base_url: Option<String>,
        api_key: Option<String>,
    ) -> Result<Config, ConfigError> {
        let flags = ServerConfig {
            base_url,
            api_key,
            ..Default::default()
        };
        flags.validate()?;

        self.overrides = self.overrides.merged(&flags);
        Ok(self)
    }

    fn effective(&self) -> ServerConfig {
        self.file
            .server
            .clone()
            .unwrap_or_default()
            .merged(&self.overrides)
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.sso/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".sso/config.toml"))
    }

    /// Where `sso config set` writes: the loaded file, or the canonical path.
    pub fn write_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.path {
            Some(p) => Ok(p.clone()),
            None => Self::default_path(),
        }
    }

    /// Write the file layer atomically to [`Config::write_path`].
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = self.write_path()?;
        Self::write_config_atomic(&path, &self.file)?;
        Ok(path)
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed; writes to a temp file in the
    /// same directory, then renames over the target.
    pub fn write_config_atomic(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the server base URL.
    ///
    /// Defaults to `http://localhost:8080`.
    pub fn base_url(&self) -> String {
        self.effective()
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Get the API key.
    ///
    /// Defaults to `default-api-key`.
    pub fn api_key(&self) -> String {
        self.effective()
            .api_key
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string())
    }

    /// Get the per-request timeout.
    ///
    /// Defaults to 30 seconds.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.effective().timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Get the priority for submitted operations.
    ///
    /// Defaults to `UserInteractive`.
    pub fn priority(&self) -> Priority {
        self.effective().priority.unwrap_or_default()
    }

    /// Get the path the config file was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref().filter(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(&temp.path().join("missing.toml"))).unwrap();

        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.api_key(), "default-api-key");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.priority(), Priority::UserInteractive);
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_sso_config_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
            [server]
            base_url = "http://storage:9000"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let lookup = env(&[("SSO_CONFIG", config_path.to_str().unwrap())]);
        let config = Config::load_with(None, lookup).unwrap();

        assert_eq!(config.base_url(), "http://storage:9000");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn missing_sso_config_file_is_the_write_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("fresh/sso.toml");
        let xdg = temp.path().join("xdg");
        fs::create_dir_all(xdg.join("sso")).unwrap();
        fs::write(xdg.join("sso/config.toml"), "[server]
api_key = \"xdg\"
").unwrap();

        let lookup = env(&[
            ("SSO_CONFIG", target.to_str().unwrap()),
            ("XDG_CONFIG_HOME", xdg.to_str().unwrap()),
        ]);
        let config = Config::load_with(None, lookup).unwrap();

        assert_eq!(config.api_key(), "default-api-key");
        assert!(config.loaded_from().is_none());
        assert_eq!(config.write_path().unwrap(), target);
    }

    #[test]
    fn empty_sso_config_is_ignored() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sso");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "[server]
api_key = \"xdg\"
").unwrap();

        let lookup = env(&[
            ("SSO_CONFIG", ""),
            ("XDG_CONFIG_HOME", temp.path().to_str().unwrap()),
        ]);
        let config = Config::load_with(None, lookup).unwrap();

        assert_eq!(config.api_key(), "xdg");
    }

    #[test]
    fn load_from_xdg() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sso");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "[server]\napi_key = \"xdg\"\n").unwrap();

        let lookup = env(&[("XDG_CONFIG_HOME", temp.path().to_str().unwrap())]);
        let config = Config::load_with(None, lookup).unwrap();

        assert_eq!(config.api_key(), "xdg");
    }

    #[test]
    fn env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            "[server]\nbase_url = \"http://file:1\"\napi_key = \"file-key\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&config_path))
            .unwrap()
            .with_env(env(&[
                ("API_BASE_URL", "http://env:2"),
                ("SSO_TIMEOUT_SECS", "7"),
            ]))
            .unwrap();

        assert_eq!(config.base_url(), "http://env:2");
        assert_eq!(config.api_key(), "file-key");
        assert_eq!(config.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn flags_override_env() {
        let config = Config::default()
            .with_env(env(&[("API_KEY", "env-key")]))
            .unwrap()
            .with_flags(None, Some("flag-key".to_string()))
            .unwrap();

        assert_eq!(config.api_key(), "flag-key");
    }

    #[test]
    fn empty_env_values_ignored() {
        let config = Config::default()
            .with_env(env(&[("API_KEY", "")]))
            .unwrap();
        assert_eq!(config.api_key(), DEFAULT_API_KEY);
    }

    #[test]
    fn invalid_env_timeout_rejected() {
        let result = Config::default().with_env(env(&[("SSO_TIMEOUT_SECS", "0")]));
        assert!(result.is_err());

        let result = Config::default().with_env(env(&[("SSO_TIMEOUT_SECS", "abc")]));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_file_value_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[server]\nbase_url = \"localhost\"\n").unwrap();

        assert!(Config::load(Some(&config_path)).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "verbose = true\n").unwrap();

        let result = Config::load(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn save_is_atomic_and_reloadable() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("nested/config.toml");

        let mut config = Config::load(Some(&config_path)).unwrap();
        config.file.set("server.api_key", "written").unwrap();

        let path = config.save().unwrap();
        assert_eq!(path, config_path);
        assert!(!config_path.with_extension("toml.tmp").exists());

        let reloaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(reloaded.api_key(), "written");
    }
}
