//! Serial and timing configuration.
//!
//! Every field has a default matching the board's expectations, so an empty
//! YAML file (or none at all) is valid. Values are layered:
//! defaults, then the YAML file, then command-line overrides.
//!
//! ```yaml
//! port: /dev/ttyUSB1
//! baud_rate: 9600
//! byte_delay_ms: 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default serial device.
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM10";
/// Default serial device.
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Default read timeout (milliseconds).
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
/// Pause after opening the port, for boards that reset on connect (milliseconds).
pub const DEFAULT_SETTLE_MS: u64 = 2000;
/// Pause after each reply byte (milliseconds).
pub const DEFAULT_BYTE_DELAY_MS: u64 = 50;
/// Sleep between polls (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`HostConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Serial device name (`COM10`, `/dev/ttyUSB0`, ...).
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Settling delay after open in milliseconds.
    pub settle_ms: u64,
    /// Pause after each reply byte in milliseconds.
    pub byte_delay_ms: u64,
    /// Sleep between polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            byte_delay_ms: DEFAULT_BYTE_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub read_timeout_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub byte_delay_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl HostConfig {
    /// Parse a config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as a map.
        if yaml.trim().is_empty() {
            return Ok(HostConfig::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.baud_rate = baud_rate;
        }
        if let Some(ms) = overrides.read_timeout_ms {
            self.read_timeout_ms = ms;
        }
        if let Some(ms) = overrides.settle_ms {
            self.settle_ms = ms;
        }
        if let Some(ms) = overrides.byte_delay_ms {
            self.byte_delay_ms = ms;
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn byte_delay(&self) -> Duration {
        Duration::from_millis(self.byte_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
