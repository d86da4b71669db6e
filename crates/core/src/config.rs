//! Connection options
//!
//! Options can be built in code, parsed from TOML, or loaded from a file, and
//! then overridden from the environment.
//!
//! ```toml
//! # Store address
//! host = "localhost"
//! port = 28015
//!
//! # Database to select, created on connect if absent
//! db = "test"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Default store host
pub const DEFAULT_HOST: &str = "localhost";
/// Default store port
pub const DEFAULT_PORT: u16 = 28015;

/// Environment variable overriding [`ConnectOptions::host`]
pub const ENV_HOST: &str = "DOCTABLE_HOST";
/// Environment variable overriding [`ConnectOptions::port`]
pub const ENV_PORT: &str = "DOCTABLE_PORT";
/// Environment variable overriding [`ConnectOptions::db`]
pub const ENV_DB: &str = "DOCTABLE_DB";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Options passed to a connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Store host
    #[serde(default = "default_host")]
    pub host: String,
    /// Store port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database to select after connecting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    /// Optional user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Optional password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: None,
            user: None,
            password: None,
        }
    }
}

impl ConnectOptions {
    /// Options targeting `host` with the default port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the database to select
    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse options from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let options: ConnectOptions = toml::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Apply `DOCTABLE_HOST`, `DOCTABLE_PORT` and `DOCTABLE_DB` overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if the port override is not a valid port number.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.parse().map_err(|_| Error::Config {
                reason: format!("invalid {} value '{}'", ENV_PORT, port),
            })?;
        }
        if let Some(db) = lookup(ENV_DB) {
            self.db = Some(db);
        }
        self.validate()?;
        Ok(self)
    }

    /// Check option consistency
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config {
                reason: "host must not be empty".to_string(),
            });
        }
        if matches!(self.db.as_deref(), Some(db) if db.trim().is_empty()) {
            return Err(Error::Config {
                reason: "db must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}
