//! Scale configuration
//!
//! A small JSON record naming the port, line speed and timing. Every field
//! has a default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};

/// Default interval between weight requests, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 0.2;

/// Longest accepted interval between weight requests, in seconds
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Default pause between connection attempts, in milliseconds
pub const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 1000;

/// Errors loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid JSON for this record
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Connection and polling settings for one scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Serial port name
    pub port: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Seconds between weight requests
    pub poll_interval: f64,

    /// Per-byte read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Pause between failed connection attempts in milliseconds
    pub reconnect_backoff_ms: u64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyS0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            reconnect_backoff_ms: DEFAULT_RECONNECT_BACKOFF_MS,
        }
    }
}

impl ScaleConfig {
    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON config
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ScaleConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port must not be empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be positive".into()));
        }
        if !self.poll_interval.is_finite()
            || self.poll_interval <= 0.0
            || self.poll_interval > MAX_POLL_INTERVAL_SECS as f64
        {
            return Err(ConfigError::Invalid(format!(
                "poll_interval must be between 0 and {} seconds, got {}",
                MAX_POLL_INTERVAL_SECS, self.poll_interval
            )));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be positive".into()));
        }
        if self.reconnect_backoff_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconnect_backoff_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Interval between weight requests
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Per-byte read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Pause between failed connection attempts
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}
