//! Configuration management for the Keystone host.
//!
//! This module handles loading, validation, and command-line overrides of the
//! host configuration stored in a TOML file.

use crate::cli::CliArgs;
use keystone_events::BridgeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_log_level() -> String {
    "info".to_string()
}

fn default_monitor_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    60
}

fn default_high_activity_threshold() -> u64 {
    10_000
}

/// Errors raised while loading or validating the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write default configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration validation failed: {0}")]
    Invalid(String),
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Notification bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Periodic health report settings
    #[serde(default)]
    pub monitor: MonitorSettings,
}

/// Logging configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

/// Health monitoring settings.
///
/// The monitor publishes a heartbeat through the bridge at a fixed interval;
/// a monitor-tier listener turns it into a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_monitor_enabled")]
    pub enabled: bool,
    /// Seconds between reports
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Notifications per interval above which activity is reported as high
    #[serde(default = "default_high_activity_threshold")]
    pub high_activity_threshold: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: default_monitor_enabled(),
            interval_secs: default_interval_secs(),
            high_activity_threshold: default_high_activity_threshold(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration is written to that
    /// path and returned. Runs before logging is set up, so it logs nothing.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            Ok(default_config)
        }
    }

    /// Reads the file named on the command line and applies the CLI overrides.
    ///
    /// The flag is true when the file was missing and a default one was written.
    pub async fn load_for(args: &CliArgs) -> Result<(Self, bool), ConfigError> {
        let created = !args.config_path.exists();
        let mut config = Self::load_from_file(&args.config_path).await?;
        config.apply_cli_overrides(args);
        Ok((config, created))
    }

    /// Applies command-line overrides on top of the file settings.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }

        if args.json_logs {
            self.logging.json_format = true;
        }

        if let Some(interval) = args.stats_interval {
            self.monitor.interval_secs = interval;
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {VALID_LOG_LEVELS:?}",
                &self.logging.level
            )));
        }

        if self.monitor.enabled && self.monitor.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor.interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.bridge.slow_handler_warn_ms, 50);
        assert!(!config.bridge.warn_on_unhandled);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.monitor.high_activity_threshold, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.logging.level = "debug".to_string();
        config.monitor.interval_secs = 0;
        assert!(config.validate().is_err());

        // a disabled monitor has no interval to check
        config.monitor.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            config_path: PathBuf::from("keystone.toml"),
            log_level: Some("trace".to_string()),
            json_logs: true,
            stats_interval: Some(5),
        };

        config.apply_cli_overrides(&args);
        assert_eq!(config.logging.level, "trace");
        assert!(config.logging.json_format);
        assert_eq!(config.monitor.interval_secs, 5);
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keystone.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());

        // the default file is written and reads back identically
        assert!(path.exists());
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[bridge]
slow_handler_warn_ms = 5

[monitor]
interval_secs = 10
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.bridge.slow_handler_warn_ms, 5);
        assert_eq!(config.monitor.interval_secs, 10);
        assert!(config.monitor.enabled);
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\ninterval_secs = \"often\"").unwrap();

        let result = AppConfig::load_from_file(file.path()).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
