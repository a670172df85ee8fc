//! Console configuration.
//!
//! Stored as RON. Every field has a default, so a file only needs the
//! settings it changes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::DEFAULT_SWITCHES_URL;
use crate::session::{DEFAULT_MAX_LINE_LENGTH, SessionConfig};

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "console.ron";

/// Default SSH port of the console.
pub const DEFAULT_PORT: u16 = 55220;

/// Errors that can occur during config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("IO error for '{path}': {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file is not valid RON for this configuration.
    #[error("parse error for '{path}': {message}")]
    Parse {
        /// The file involved.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// Serializing the configuration failed.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// An option has an unusable value.
    #[error("invalid value for '{key}': {value}")]
    Invalid {
        /// Option name.
        key: String,
        /// The rejected value.
        value: String,
    },
}

/// Settings for the console server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// TCP port the SSH server listens on.
    pub port: u16,
    /// Address to bind.
    pub bind_address: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Path of the OpenSSH host key, created when missing.
    pub hostkey: String,
    /// Prompt shown to users.
    pub prompt: String,
    /// Message shown after login.
    pub banner: Option<String>,
    /// Lines of history kept per session.
    pub history_size: usize,
    /// Longest input line accepted, in bytes.
    pub max_line_length: usize,
    /// Switch status endpoint queried by `show switch`.
    pub rest_url: String,
    /// Timeout for backend HTTP requests, in seconds.
    pub rest_timeout_secs: u64,
    /// Render error lines in color.
    pub colored: bool,
    /// Idle connections are dropped after this many seconds (0 disables).
    pub inactivity_timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: "0.0.0.0".to_string(),
            username: "root".to_string(),
            password: "password".to_string(),
            hostkey: "ssh_host_ed25519_key".to_string(),
            prompt: "controller> ".to_string(),
            banner: None,
            history_size: 100,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            rest_url: DEFAULT_SWITCHES_URL.to_string(),
            rest_timeout_secs: 10,
            colored: false,
            inactivity_timeout_secs: 3600,
        }
    }
}

impl ConsoleConfig {
    /// Load config from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        ron::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save config to a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
        let contents = ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load config from file, returning the default if it can't be read.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Build a config from controller-style key/value options.
    ///
    /// Recognized keys are `port`, `username`, `password`, `hostkey`,
    /// `bind_address`, `prompt` and `rest_url`; others are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = params.get("port") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "port".to_string(),
                value: port.clone(),
            })?;
        }
        for (key, field) in [
            ("username", &mut config.username),
            ("password", &mut config.password),
            ("hostkey", &mut config.hostkey),
            ("bind_address", &mut config.bind_address),
            ("prompt", &mut config.prompt),
            ("rest_url", &mut config.rest_url),
        ] {
            if let Some(value) = params.get(key) {
                *field = value.clone();
            }
        }

        Ok(config)
    }

    /// Session settings derived from this config.
    pub fn session_config(&self, echo: bool) -> SessionConfig {
        SessionConfig {
            prompt: self.prompt.clone(),
            banner: self.banner.clone(),
            history_size: self.history_size,
            max_line_length: self.max_line_length,
            echo,
            colored: self.colored,
        }
    }

    /// Backend request timeout.
    pub fn rest_timeout(&self) -> Duration {
        Duration::from_secs(self.rest_timeout_secs)
    }

    /// Idle timeout, if enabled.
    pub fn inactivity_timeout(&self) -> Option<Duration> {
        (self.inactivity_timeout_secs > 0).then(|| Duration::from_secs(self.inactivity_timeout_secs))
    }
}
