//! CLI configuration management

use crate::notify::NotifyMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configured stream URL
pub const STREAM_URL_ENV: &str = "HOOKWATCH_STREAM_URL";

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hookwatch")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hookwatch")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Get the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure all config directories exist
pub fn ensure_dirs() -> Result<()> {
    fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
    fs::create_dir_all(logs_dir()).context("Failed to create logs directory")?;
    Ok(())
}

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Event stream endpoint of the capture server
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// Whether to show a notification for new requests
    #[serde(default)]
    pub notifications: NotifyMode,

    /// Delay before reconnecting a dropped stream, unless the server sets one
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Interval between fake requests in demo mode
    #[serde(default = "default_demo_interval_secs")]
    pub demo_interval_secs: u64,
}

fn default_stream_url() -> String {
    "http://localhost:8080/sse".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_demo_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_url: default_stream_url(),
            notifications: NotifyMode::default(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            demo_interval_secs: default_demo_interval_secs(),
        }
    }
}

impl Config {
    /// Load config from the default file, applying environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_file())?;
        if let Ok(url) = std::env::var(STREAM_URL_ENV) {
            if !url.trim().is_empty() {
                config.stream_url = url;
            }
        }
        Ok(config)
    }

    /// Load config from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to the default file
    pub fn save(&self) -> Result<()> {
        ensure_dirs()?;
        self.save_to(&config_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Set the stream URL after checking it is an http(s) URL
    pub fn set_stream_url(&mut self, url: &str) -> Result<()> {
        let parsed = reqwest::Url::parse(url).with_context(|| format!("Invalid stream URL: {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Stream URL must use http or https, got {}", parsed.scheme());
        }
        self.stream_url = parsed.to_string();
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn demo_interval(&self) -> Duration {
        Duration::from_secs(self.demo_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hookwatch-{}-{}.yml", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(&temp_path("missing")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.stream_url, "http://localhost:8080/sse");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial");
        fs::write(&path, "notifications: never\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.notifications, NotifyMode::Never);
        assert_eq!(config.stream_url, "http://localhost:8080/sse");
        assert_eq!(config.demo_interval_secs, 5);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut config = Config::default();
        config.set_stream_url("https://hooks.example.com/sse").unwrap();
        config.notifications = NotifyMode::Always;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = temp_path("invalid");
        fs::write(&path, "reconnect_delay_ms: [1, 2]\n").unwrap();

        let result = Config::load_from(&path);
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn test_set_stream_url_validation() {
        let mut config = Config::default();

        assert!(config.set_stream_url("not a url").is_err());
        assert!(config.set_stream_url("ftp://example.com/sse").is_err());
        assert_eq!(config.stream_url, "http://localhost:8080/sse");

        config.set_stream_url("http://127.0.0.1:9000/events").unwrap();
        assert_eq!(config.stream_url, "http://127.0.0.1:9000/events");
    }

    #[test]
    fn test_demo_interval_never_zero() {
        let config = Config {
            demo_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.demo_interval(), Duration::from_secs(1));
    }
}
