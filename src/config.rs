//! Session configuration for TN3270R
//!
//! A [`SessionConfig`] names the host to connect to and the few knobs of the
//! session: terminal type, code page, receive buffer size and timing. It
//! round-trips through JSON so a session can be kept in a file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::protocol_common::ebcdic::codec_for_page;

/// Environment variable overriding the default config file location
pub const CONFIG_ENV_VAR: &str = "TN3270R_CONFIG";

/// Smallest receive buffer accepted by [`SessionConfig::validate`]
pub const MIN_RECEIVE_BUFFER: usize = 64;

/// Connection and session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Host name or address
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Terminal type announced during negotiation
    pub terminal_type: String,

    /// EBCDIC code page for screen text
    pub code_page: u16,

    /// Capacity of one transport read, and the most bytes of a single
    /// unterminated record the client will hold
    pub receive_buffer_size: usize,

    /// Interval at which `wait_for_text` checks the screen
    pub wait_poll_interval_ms: u64,

    /// Limit on establishing the TCP connection
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 23,
            terminal_type: "IBM-3278-2".to_string(),
            code_page: 37,
            receive_buffer_size: 5000,
            wait_poll_interval_ms: 50,
            connect_timeout_secs: 30,
        }
    }
}

impl SessionConfig {
    /// Defaults for everything but the target
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check that the configuration can drive a session
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("host", &self.host, "host must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", &self.port, "port must be between 1 and 65535"));
        }
        if self.terminal_type.is_empty() || !self.terminal_type.is_ascii() {
            return Err(invalid(
                "terminal_type",
                &self.terminal_type,
                "terminal type must be non-empty ASCII",
            ));
        }
        if self.receive_buffer_size < MIN_RECEIVE_BUFFER {
            return Err(invalid(
                "receive_buffer_size",
                &self.receive_buffer_size,
                &format!("must be at least {MIN_RECEIVE_BUFFER} bytes"),
            ));
        }
        if self.wait_poll_interval_ms == 0 {
            return Err(invalid("wait_poll_interval_ms", &0, "interval must be positive"));
        }
        codec_for_page(self.code_page)?;
        Ok(())
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Save configuration as JSON, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let file_error = |source: std::io::Error| ConfigError::File {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(file_error)?;
            }
        }
        fs::write(path, self.to_json()?).map_err(file_error)
    }
}

fn invalid(parameter: &str, value: &dyn std::fmt::Display, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Determine the default config file path.
/// Priority:
/// 1) TN3270R_CONFIG env var
/// 2) Platform config dir (`dirs::config_dir`)/tn3270r/session.json
/// 3) Current directory fallback: ./session.json
pub fn default_config_path() -> PathBuf {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR) {
        return PathBuf::from(p);
    }

    dirs::config_dir()
        .map(|base| base.join("tn3270r").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}
