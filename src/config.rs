//! Bridge configuration.
//!
//! Loaded from `~/.config/serlink/config.toml` when present; every field has a
//! default so an empty or missing file yields a working configuration. CLI
//! flags override file values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config validation failed: {message}")]
    Validation { message: String },
}

/// Settings for one bridge session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host the emulator exposes its virtual serial port on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port of the virtual serial port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Command line that launches the emulator.
    #[serde(default = "default_emulator_command")]
    pub emulator_command: Vec<String>,
    /// Connection attempts before giving up (default: 5).
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// Delay between connection attempts in milliseconds (default: 1000).
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Fixed delay after spawning the emulator before the first connect
    /// attempt, in milliseconds (default: 3000).
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// How long to wait for the monitor prompt before proceeding anyway,
    /// in seconds (default: 10).
    #[serde(default = "default_prompt_timeout_secs")]
    pub prompt_timeout_secs: u64,
    /// Grace period between SIGTERM and SIGKILL at shutdown, in milliseconds
    /// (default: 2000).
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5555
}

fn default_emulator_command() -> Vec<String> {
    vec!["make".to_string(), "run".to_string()]
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_retry_interval_ms() -> u64 {
    1000
}

fn default_startup_delay_ms() -> u64 {
    3000
}

fn default_prompt_timeout_secs() -> u64 {
    10
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            emulator_command: default_emulator_command(),
            connect_attempts: default_connect_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            prompt_timeout_secs: default_prompt_timeout_secs(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl BridgeConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/serlink/config.toml` on Unix/macOS, or equivalent on
    /// other platforms via `dirs::config_dir()`. Falls back to the current
    /// directory if no config dir is available.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("serlink").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `BridgeConfig::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Loads configuration from a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.emulator_command.is_empty() {
            return Err(ConfigError::Validation {
                message: "emulator_command must not be empty".to_string(),
            });
        }

        if self.connect_attempts == 0 {
            return Err(ConfigError::Validation {
                message: "connect_attempts must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5555);
        assert_eq!(config.emulator_command, vec!["make", "run"]);
        assert_eq!(config.connect_attempts, 5);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: BridgeConfig = toml::from_str("port = 6000\nconnect_attempts = 3\n").unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.connect_attempts, 3);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.retry_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn empty_emulator_command_fails_validation() {
        let config = BridgeConfig {
            emulator_command: Vec::new(),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let config = BridgeConfig {
            connect_attempts: 0,
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "host = \"127.0.0.1\"\nport = 7777\n").unwrap();

        let config = BridgeConfig::from_file(&path).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7777);
    }

    #[test]
    fn from_file_missing_reports_read_error() {
        let err = BridgeConfig::from_file(Path::new("/nonexistent/serlink.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
