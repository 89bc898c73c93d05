//! core::config
//!
//! Configuration loading and the read-only connection registry.
//!
//! # Config File Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path (e.g. `--config`)
//! 2. `$LAKEHOOK_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/lakehook/config.toml`
//! 4. `~/.lakehook/config.toml`
//!
//! Missing files are not an error; defaults are used.
//!
//! # Connection Lookup
//!
//! A connection id resolves from, in order:
//! 1. `$LAKEHOOK_CONN_<ID>` holding a JSON descriptor (id upper-cased,
//!    `-` and `.` mapped to `_`)
//! 2. `[connections.<id>]` in the config file
//!
//! Connections are only read here; storing credentials is left to
//! whatever system owns them.
//!
//! # Example
//!
//! ```no_run
//! use lakehook::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! let conn = config.connection("lakefs_default").unwrap();
//! println!("page size: {}", config.page_size());
//! ```

pub mod schema;

pub use schema::{ClientConfig, FileConfig, PollConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::connection::Connection;
use crate::sensors::PollPolicy;
use crate::store::{ClientSettings, CommitLookup, DEFAULT_PAGE_SIZE};

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "LAKEHOOK_CONFIG";

/// Prefix of per-connection environment variables.
pub const CONN_ENV_PREFIX: &str = "LAKEHOOK_CONN_";

/// Connection id used when none is given.
pub const DEFAULT_CONNECTION_ID: &str = "lakefs_default";

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

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown connection '{0}'")]
    UnknownConnection(String),

    #[error("failed to parse connection from ${var}: {message}")]
    InvalidConnectionEnv { var: String, message: String },
}

/// Loaded configuration with accessors that apply defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (defaults when no file was found)
    pub file: FileConfig,
    /// Path the config was loaded from
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path cannot be read, or if a config
    /// file exists but cannot be parsed or fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::locate(),
        };

        let file = match &path {
            Some(path) => Self::read(path)?,
            None => FileConfig::default(),
        };
        file.validate()?;

        Ok(Config { file, path })
    }

    /// Build a config from already parsed contents.
    pub fn from_file_config(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Config { file, path: None })
    }

    /// Find the first existing config file in the default locations.
    fn locate() -> Option<PathBuf> {
        // 1. Check $LAKEHOOK_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/lakehook/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("lakehook/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.lakehook/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".lakehook/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Environment variable consulted for a connection id.
    ///
    /// ```
    /// use lakehook::core::config::Config;
    ///
    /// assert_eq!(Config::connection_env_var("lakefs-prod"), "LAKEHOOK_CONN_LAKEFS_PROD");
    /// ```
    pub fn connection_env_var(id: &str) -> String {
        let suffix: String = id
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", CONN_ENV_PREFIX, suffix)
    }

    /// Look up a connection descriptor by id.
    ///
    /// # Errors
    ///
    /// - `InvalidConnectionEnv` if the environment variable is not valid JSON
    /// - `UnknownConnection` if neither source defines the id
    pub fn connection(&self, id: &str) -> Result<Connection, ConfigError> {
        let var = Self::connection_env_var(id);
        if let Ok(raw) = std::env::var(&var) {
            return serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidConnectionEnv {
                var,
                message: e.to_string(),
            });
        }

        self.file
            .connections
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownConnection(id.to_string()))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Client settings for `LakeFsClient`.
    pub fn client_settings(&self) -> ClientSettings {
        let client = self.file.client.as_ref();
        ClientSettings {
            timeout: client
                .and_then(|c| c.timeout_secs)
                .map(Duration::from_secs),
            commit_lookup: client
                .and_then(|c| c.commit_lookup.as_deref())
                .and_then(CommitLookup::parse)
                .unwrap_or_default(),
        }
    }

    /// Commits per log page.
    ///
    /// Defaults to 100 if not configured.
    pub fn page_size(&self) -> usize {
        self.file
            .client
            .as_ref()
            .and_then(|c| c.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Sensor polling policy, falling back to the sensor defaults.
    pub fn poll_policy(&self) -> PollPolicy {
        let defaults = PollPolicy::default();
        let poll = self.file.poll.as_ref();
        PollPolicy {
            interval: poll
                .and_then(|p| p.interval_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            timeout: poll
                .and_then(|p| p.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (temp, path)
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.client_settings(), ClientSettings::default());
        assert_eq!(config.poll_policy(), PollPolicy::default());
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_explicit_path() {
        let (_temp, path) = write_config(
            r#"
            [client]
            timeout_secs = 7
            page_size = 25
            commit_lookup = "endpoint"

            [poll]
            interval_secs = 2
            timeout_secs = 20
            "#,
        );

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.loaded_from(), Some(path.as_path()));
        assert_eq!(config.page_size(), 25);
        assert_eq!(
            config.client_settings(),
            ClientSettings {
                timeout: Some(Duration::from_secs(7)),
                commit_lookup: CommitLookup::Endpoint,
            }
        );
        assert_eq!(
            config.poll_policy(),
            PollPolicy {
                interval: Duration::from_secs(2),
                timeout: Duration::from_secs(20),
            }
        );
    }

    #[test]
    fn missing_explicit_path_is_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(&temp.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn invalid_values_rejected() {
        let (_temp, path) = write_config("[poll]\ninterval_secs = 0\n");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let (_temp, path) = write_config("[client\n");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn connection_from_file() {
        let (_temp, path) = write_config(
            r#"
            [connections.file_only_conn]
            host = "lakefs:8000"
            login = "AK"
            password = "SK"
            "#,
        );
        let config = Config::load(Some(&path)).unwrap();
        let conn = config.connection("file_only_conn").unwrap();
        assert_eq!(conn.login.as_deref(), Some("AK"));

        assert!(matches!(
            config.connection("nope_not_defined"),
            Err(ConfigError::UnknownConnection(_))
        ));
    }

    #[test]
    fn connection_env_overrides_file() {
        let (_temp, path) = write_config(
            r#"
            [connections.env_override_conn]
            host = "from-file"
            "#,
        );
        let config = Config::load(Some(&path)).unwrap();

        let var = Config::connection_env_var("env_override_conn");
        std::env::set_var(&var, r#"{"host": "from-env", "login": "a", "password": "b"}"#);
        let conn = config.connection("env_override_conn").unwrap();
        std::env::remove_var(&var);

        assert_eq!(conn.host.as_deref(), Some("from-env"));
    }

    #[test]
    fn malformed_env_connection() {
        let var = Config::connection_env_var("malformed_env_conn");
        std::env::set_var(&var, "not json");
        let result = Config::default().connection("malformed_env_conn");
        std::env::remove_var(&var);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidConnectionEnv { .. })
        ));
    }
}
