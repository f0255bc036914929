//! Configuration for FocusFlow.

use crate::aoi::Viewport;
use crate::collector::CollectorConfig;
use crate::metrics::DEFAULT_SAMPLING_INTERVAL_SECS;
use crate::protocol::{ClientConfig, DEFAULT_APP_KEY, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "focusflow";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the GazeFlow tracker listens
    pub tracker: TrackerConfig,

    /// Pause between reads in the collector thread
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,

    /// Nominal seconds per sample, used when a session holds one sample
    pub sampling_interval_secs: f64,

    /// Mapping from tracker screen space into AOI space
    pub viewport: Option<Viewport>,

    /// Directory for session reports
    pub export_path: PathBuf,

    /// Directory for AOI definitions and stream statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            tracker: TrackerConfig::default(),
            poll_interval: Duration::from_millis(15),
            sampling_interval_secs: DEFAULT_SAMPLING_INTERVAL_SECS,
            viewport: None,
            export_path: data_dir.join("reports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Path of the persisted AOI definitions.
    pub fn aois_path(&self) -> PathBuf {
        self.data_path.join("aois.json")
    }

    /// Path of the persisted stream statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Collector settings derived from this configuration.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            host: self.tracker.host.clone(),
            port: self.tracker.port,
            app_key: self.tracker.app_key.clone(),
            poll_interval: self.poll_interval,
            client: ClientConfig::default(),
        }
    }
}

/// Connection settings for the GazeFlow tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub host: String,
    pub port: u16,
    pub app_key: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            app_key: DEFAULT_APP_KEY.to_string(),
        }
    }
}

impl TrackerConfig {
    /// Apply command-line overrides for one run.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        app_key: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(app_key) = app_key {
            self.app_key = app_key;
        }
        self
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.host, "127.0.0.1");
        assert_eq!(config.tracker.port, 43333);
        assert_eq!(config.tracker.app_key, "AppKeyDemo");
        assert_eq!(config.poll_interval, Duration::from_millis(15));
        assert_eq!(config.sampling_interval_secs, 0.015);
        assert!(config.viewport.is_none());
        assert!(config.aois_path().ends_with("aois.json"));
        assert!(config.stats_path().ends_with("stats.json"));
    }

    #[test]
    fn test_overrides() {
        let tracker =
            TrackerConfig::default().with_overrides(None, Some(5000), Some("Key".to_string()));
        assert_eq!(tracker.host, "127.0.0.1");
        assert_eq!(tracker.port, 5000);
        assert_eq!(tracker.app_key, "Key");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.poll_interval = Duration::from_millis(40);
        config.viewport = Some(Viewport::new(1920.0, 1080.0, 810.0, 540.0));
        config.save_to(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"poll_interval\": 40"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.poll_interval, Duration::from_millis(40));
        assert_eq!(loaded.viewport, config.viewport);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tracker": {"port": 1234}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tracker.port, 1234);
        assert_eq!(config.tracker.app_key, "AppKeyDemo");
        assert_eq!(config.poll_interval, Duration::from_millis(15));
    }

    #[test]
    fn test_collector_config() {
        let collector = Config::default().collector_config();
        assert_eq!(collector.port, 43333);
        assert_eq!(collector.poll_interval, Duration::from_millis(15));
    }
}
