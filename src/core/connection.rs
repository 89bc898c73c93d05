//! core::connection
//!
//! Connection descriptors and their resolution into a validated
//! [`ConnectionConfig`].
//!
//! # Credential Resolution
//!
//! A descriptor may carry credentials in two places:
//! - the structured `extra` fields (`access_key_id`, `secret_access_key`)
//! - the plain `login` / `password` fields
//!
//! The extra fields win only when the connection type is an auth-bearing
//! flavor and BOTH keys are present and non-empty there. Otherwise the
//! login/password pair is used. See [`resolve_credentials`].
//!
//! # Host Normalization
//!
//! A host without a URL scheme gets `http://`. Callers that want TLS must
//! spell out `https://`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection types whose `extra` fields may carry credentials.
pub const EXTRA_CREDENTIAL_CONN_TYPES: &[&str] = &["http", "lakefs"];

/// Connection type assumed when a descriptor declares none.
pub const DEFAULT_CONN_TYPE: &str = "lakefs";

/// Scheme prefixed to hosts given without one.
const DEFAULT_SCHEME: &str = "http://";

/// Errors resolving a connection descriptor. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("access_key_id must be specified in the lakeFS connection details")]
    MissingAccessKey,

    #[error("secret_access_key must be specified in the lakeFS connection details")]
    MissingSecretKey,

    #[error("lakeFS endpoint must be specified in the lakeFS connection details")]
    MissingHost,

    #[error("invalid lakeFS endpoint '{host}': {reason}")]
    InvalidHost { host: String, reason: String },
}

/// Structured credential fields of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionExtra {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// A connection descriptor as handed over by an orchestrator's registry.
///
/// # Example
///
/// ```
/// use lakehook::core::connection::Connection;
///
/// let conn: Connection = serde_json::from_str(
///     r#"{"host": "lakefs:8000", "login": "AKIA", "password": "secret"}"#,
/// ).unwrap();
/// let config = conn.resolve().unwrap();
/// assert_eq!(config.host(), "http://lakefs:8000");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub host: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub conn_type: Option<String>,
    pub extra: ConnectionExtra,
}

// Custom Debug to avoid exposing secrets
impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("login", &self.login)
            .field("has_password", &self.password.is_some())
            .field("conn_type", &self.conn_type)
            .field("has_extra_credentials", &self.has_extra_credentials())
            .finish()
    }
}

impl Connection {
    /// A plain connection using login/password credentials.
    pub fn new(
        host: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            login: Some(login.into()),
            password: Some(password.into()),
            conn_type: Some(DEFAULT_CONN_TYPE.to_string()),
            extra: ConnectionExtra::default(),
        }
    }

    /// Set the structured credential fields.
    pub fn with_extra(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.extra = ConnectionExtra {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
        };
        self
    }

    /// Set the declared connection type.
    pub fn with_conn_type(mut self, conn_type: impl Into<String>) -> Self {
        self.conn_type = Some(conn_type.into());
        self
    }

    /// Declared connection type, or [`DEFAULT_CONN_TYPE`].
    pub fn conn_type(&self) -> &str {
        self.conn_type.as_deref().unwrap_or(DEFAULT_CONN_TYPE)
    }

    /// Whether the extra fields hold a complete, usable credential pair.
    pub fn has_extra_credentials(&self) -> bool {
        let auth_bearing = EXTRA_CREDENTIAL_CONN_TYPES.contains(&self.conn_type());
        auth_bearing
            && non_empty(self.extra.access_key_id.as_deref()).is_some()
            && non_empty(self.extra.secret_access_key.as_deref()).is_some()
    }

    /// Validate and normalize into a [`ConnectionConfig`].
    ///
    /// # Errors
    ///
    /// Returns the first missing field in the order access key, secret key,
    /// host.
    pub fn resolve(&self) -> Result<ConnectionConfig, ConfigurationError> {
        let (access_key, secret_key) = resolve_credentials(self);
        ConnectionConfig::new(
            self.host.as_deref().unwrap_or_default(),
            access_key.unwrap_or_default(),
            secret_key.unwrap_or_default(),
        )
    }
}

/// Pick the credential pair for a connection.
///
/// Extra fields are preferred when [`Connection::has_extra_credentials`]
/// holds; otherwise login/password are returned as-is, possibly empty.
pub fn resolve_credentials(conn: &Connection) -> (Option<&str>, Option<&str>) {
    if conn.has_extra_credentials() {
        (
            conn.extra.access_key_id.as_deref(),
            conn.extra.secret_access_key.as_deref(),
        )
    } else {
        (conn.login.as_deref(), conn.password.as_deref())
    }
}

/// Validated connection settings: endpoint plus credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: String,
    access_key: String,
    secret_key: String,
}

// Custom Debug to avoid exposing secret_key
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    /// Build a config, checking each field independently.
    ///
    /// # Errors
    ///
    /// - `MissingAccessKey`, `MissingSecretKey`, `MissingHost` for empty fields
    pub fn new(
        host: impl AsRef<str>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.trim().is_empty() {
            return Err(ConfigurationError::MissingAccessKey);
        }
        if secret_key.trim().is_empty() {
            return Err(ConfigurationError::MissingSecretKey);
        }
        let host = host.as_ref().trim();
        if host.is_empty() {
            return Err(ConfigurationError::MissingHost);
        }
        Ok(Self {
            host: normalize_host(host),
            access_key,
            secret_key,
        })
    }

    /// The normalized endpoint, always with a scheme and no trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

/// Add the default scheme when missing and drop trailing slashes.
///
/// ```
/// use lakehook::core::connection::normalize_host;
///
/// assert_eq!(normalize_host("example.com"), "http://example.com");
/// assert_eq!(normalize_host("https://example.com/"), "https://example.com");
/// ```
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, host)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_added_when_missing() {
        let config = ConnectionConfig::new("example.com", "ak", "sk").unwrap();
        assert_eq!(config.host(), "http://example.com");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let config = ConnectionConfig::new("https://example.com", "ak", "sk").unwrap();
        assert_eq!(config.host(), "https://example.com");
    }

    #[test]
    fn missing_fields_are_named() {
        assert_eq!(
            ConnectionConfig::new("h", "", "sk"),
            Err(ConfigurationError::MissingAccessKey)
        );
        assert_eq!(
            ConnectionConfig::new("h", "ak", ""),
            Err(ConfigurationError::MissingSecretKey)
        );
        assert_eq!(
            ConnectionConfig::new("", "ak", "sk"),
            Err(ConfigurationError::MissingHost)
        );
    }

    #[test]
    fn access_key_checked_before_host() {
        let conn = Connection::default();
        assert_eq!(conn.resolve(), Err(ConfigurationError::MissingAccessKey));
    }

    #[test]
    fn extra_credentials_take_priority() {
        let conn = Connection::new("lakefs:8000", "login", "password")
            .with_conn_type("http")
            .with_extra("AKIA-extra", "secret-extra");
        let config = conn.resolve().unwrap();
        assert_eq!(config.access_key(), "AKIA-extra");
        assert_eq!(config.secret_key(), "secret-extra");
    }

    #[test]
    fn partial_extra_falls_back_to_login() {
        let mut conn = Connection::new("lakefs:8000", "login", "password").with_conn_type("http");
        conn.extra.access_key_id = Some("AKIA-extra".into());
        let config = conn.resolve().unwrap();
        assert_eq!(config.access_key(), "login");
        assert_eq!(config.secret_key(), "password");
    }

    #[test]
    fn extra_ignored_for_other_conn_types() {
        let conn = Connection::new("lakefs:8000", "login", "password")
            .with_conn_type("postgres")
            .with_extra("AKIA-extra", "secret-extra");
        assert_eq!(resolve_credentials(&conn), (Some("login"), Some("password")));
    }

    #[test]
    fn extra_used_without_conn_type() {
        let mut conn = Connection::new("lakefs:8000", "login", "password")
            .with_extra("AKIA-extra", "secret-extra");
        conn.conn_type = None;
        assert_eq!(conn.conn_type(), "lakefs");
        assert!(conn.has_extra_credentials());
        assert_eq!(
            resolve_credentials(&conn),
            (Some("AKIA-extra"), Some("secret-extra"))
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let conn = Connection::new("h", "ak", "very-secret").with_extra("ak2", "also-secret");
        let out = format!("{:?} {:?}", conn, conn.resolve().unwrap());
        assert!(!out.contains("very-secret"));
        assert!(!out.contains("also-secret"));
    }

    #[test]
    fn deserializes_registry_shape() {
        let conn: Connection = serde_json::from_str(
            r#"{"host":"https://lake.example","conn_type":"http",
                "extra":{"access_key_id":"AK","secret_access_key":"SK"}}"#,
        )
        .unwrap();
        let config = conn.resolve().unwrap();
        assert_eq!(config.host(), "https://lake.example");
        assert_eq!(config.access_key(), "AK");
    }
}
