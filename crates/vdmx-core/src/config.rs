//! Bridge configuration.
//!
//! Stored as TOML. A missing, unreadable or invalid file is replaced with the
//! defaults so the next start has something valid to edit.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Art-Net UDP port.
pub const ARTNET_PORT: u16 = 6454;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Configuration for a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Serial port of the fixture controller.
    pub port: String,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Art-Net universe (0-15).
    pub universe: u8,
    /// Art-Net subnet (0-15).
    pub subnet: u8,
    /// Art-Net net (0-127).
    pub net: u8,
    /// Address the Art-Net listener binds to.
    pub bind_address: String,
    /// Serial read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Network silence before the link counts as lost, in seconds.
    pub link_timeout_secs: u64,
    /// Watchdog check period in milliseconds.
    pub watchdog_period_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: 115_200,
            universe: 0,
            subnet: 0,
            net: 0,
            bind_address: "0.0.0.0".to_string(),
            read_timeout_ms: 500,
            link_timeout_secs: 3,
            watchdog_period_ms: 1000,
        }
    }
}

fn default_port() -> &'static str {
    if cfg!(windows) { "COM17" } else { "/dev/ttyUSB0" }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path`, or write and return the defaults if it cannot be used.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error loading config, writing defaults");
                let config = Self::default();
                config.save_to_file(path)?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "port",
                message: "must not be empty".into(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "baud_rate",
                message: "must be positive".into(),
            });
        }
        if self.universe > 0x0F {
            return Err(ConfigError::Invalid {
                field: "universe",
                message: format!("{} out of range 0-15", self.universe),
            });
        }
        if self.subnet > 0x0F {
            return Err(ConfigError::Invalid {
                field: "subnet",
                message: format!("{} out of range 0-15", self.subnet),
            });
        }
        if self.net > 0x7F {
            return Err(ConfigError::Invalid {
                field: "net",
                message: format!("{} out of range 0-127", self.net),
            });
        }
        if self.read_timeout_ms == 0 || self.watchdog_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timeouts",
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// 15-bit Art-Net port-address: `net:7 | subnet:4 | universe:4`.
    pub fn port_address(&self) -> u16 {
        ((self.net as u16 & 0x7F) << 8) | ((self.subnet as u16 & 0x0F) << 4) | (self.universe as u16 & 0x0F)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn link_timeout(&self) -> Duration {
        Duration::from_secs(self.link_timeout_secs)
    }

    pub fn watchdog_period(&self) -> Duration {
        Duration::from_millis(self.watchdog_period_ms)
    }
}
