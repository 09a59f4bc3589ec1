//! Configuration file parsing and structures.
//!
//! The exporter reads an optional TOML file. Every section has defaults, so
//! running without a file talks to the stock device address and listens on
//! port 8080.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing_subscriber::filter::LevelFilter;

/// Address the moisture monitor gets from the home router
pub const DEFAULT_DEVICE_ADDRESS: &str = "192.168.1.169";

pub const DEFAULT_LISTEN: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub device: DeviceConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,

    /// Per-target levels, e.g. `"tower_http" = "debug"`
    pub overrides: HashMap<String, LogLevel>,
}

/// The device we pull resources from
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// `host` or `host:port`
    pub address: String,

    /// Request timeout. The HTTP client default applies when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_DEVICE_ADDRESS.to_string(),
            timeout_secs: None,
        }
    }
}

/// Where the scrape endpoint listens
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub listen: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.device.address, DEFAULT_DEVICE_ADDRESS);
        assert_eq!(config.device.timeout_secs, None);
        assert_eq!(config.api.listen, "0.0.0.0");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.logging.overrides.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [device]
            address = "plants.local:8081"
            timeout_secs = 3

            [api]
            listen = "127.0.0.1"
            port = 9100

            [logging]
            level = "debug"

            [logging.overrides]
            "tower_http" = "trace"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.device.address, "plants.local:8081");
        assert_eq!(config.device.timeout_secs, Some(3));
        assert_eq!(config.api.listen, "127.0.0.1");
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.overrides.get("tower_http"),
            Some(&LogLevel::Trace)
        );
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_toml("[api]\nport = 9000").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.listen, DEFAULT_LISTEN);
        assert_eq!(config.device.address, DEFAULT_DEVICE_ADDRESS);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = Config::from_toml("[device]\nadress = \"10.0.0.2\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        let result = Config::from_toml("[metrics]\nenabled = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let result = Config::from_toml("[logging]\nlevel = \"loud\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("moisture_exporter.toml");
        fs::write(&path, "[device]\naddress = \"10.0.0.7\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.device.address, "10.0.0.7");
    }

    #[test]
    fn test_missing_file_error() {
        let missing_path = PathBuf::from("/nonexistent/config.toml");

        let err = Config::from_file(&missing_path).unwrap_err();
        let err_msg = err.to_string();
        assert!(err_msg.contains("Failed to read"), "Error should mention read failure");
        assert!(err_msg.contains("/nonexistent/config.toml"), "Error should include file path");
    }

    #[test]
    fn test_example_config_parses() {
        let example = include_str!("../../../moisture_exporter.example.toml");

        let config = Config::from_toml(example).unwrap();
        assert_eq!(config.device.address, DEFAULT_DEVICE_ADDRESS);
        assert_eq!(config.api.port, DEFAULT_PORT);
        assert_eq!(
            config.logging.overrides.get("tower_http"),
            Some(&LogLevel::Debug)
        );
    }

    #[test]
    fn test_level_filter_conversion() {
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }
}
