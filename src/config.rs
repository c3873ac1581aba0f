//! Configuration management for ChargeSync
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{ChargeSyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_poll_interval_seconds() -> u64 {
    10
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Charger identity used as the device key of the cloud API
    pub device_id: String,

    /// Polling interval in seconds
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Charger cloud API connection settings
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,
}

/// Charger cloud API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API, without trailing slash
    pub base_url: String,

    /// Account user name
    pub username: String,

    /// Account password - kept out of serialized output
    #[serde(skip_serializing)]
    pub password: String,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the status API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wall-box.com".to_string(),
            username: String::new(),
            password: String::new(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/chargesync.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_id: "charger".to_string(),
            poll_interval_seconds: default_poll_interval_seconds(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "chargesync_config.yaml",
            "/data/chargesync_config.yaml",
            "/etc/chargesync/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            return Err(ChargeSyncError::validation(
                "device_id",
                "Device id cannot be empty",
            ));
        }

        if self.poll_interval_seconds == 0 {
            return Err(ChargeSyncError::validation(
                "poll_interval_seconds",
                "Must be greater than 0",
            ));
        }

        let max_interval = crate::driver::MAX_POLL_INTERVAL.as_secs();
        if self.poll_interval_seconds > max_interval {
            return Err(ChargeSyncError::validation(
                "poll_interval_seconds".to_string(),
                format!("Must be at most {}", max_interval),
            ));
        }

        if self.api.base_url.trim().is_empty() {
            return Err(ChargeSyncError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(ChargeSyncError::validation(
                "api.request_timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if crate::logging::parse_log_level(&self.logging.level).is_err() {
            return Err(ChargeSyncError::validation(
                "logging.level",
                "Unknown log level",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(ChargeSyncError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
