//! Configuration for the retail emotion agent.

use crate::events::DEFAULT_CAPACITY;
use crate::producers::simulator::{DEFAULT_MAX_INTERVAL_MS, DEFAULT_MIN_INTERVAL_MS};
use crate::producers::upload::{DEFAULT_IMAGE_DELAY, DEFAULT_VIDEO_DELAY};
use crate::producers::Schedule;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection sensitivity (0-100), passed through to the calling layer
    pub sensitivity: u8,

    /// Confidence threshold (0-100) a calling layer may filter on
    pub confidence_threshold: u8,

    /// Number of events kept in the history
    pub store_capacity: usize,

    /// Delay bounds between live detections
    pub live_interval: IntervalConfig,

    /// Period of the histogram timer
    #[serde(with = "duration_serde")]
    pub histogram_interval: Duration,

    /// Period of the rolling stats timer
    #[serde(with = "duration_serde")]
    pub stats_interval: Duration,

    /// Simulated processing time for uploaded images
    #[serde(with = "millis_serde")]
    pub image_delay: Duration,

    /// Simulated processing time for uploaded videos
    #[serde(with = "millis_serde")]
    pub video_delay: Duration,

    /// Centre of the average dwell band, in minutes
    pub dwell_baseline: f64,

    /// IANA time zone used when rendering timestamps
    pub timezone: String,

    /// Seed for all simulated randomness; entropy when unset
    pub seed: Option<u64>,

    /// Path for CSV/JSON exports
    pub export_path: PathBuf,

    /// Path for storing session counters
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retail-emotion-agent");

        Self {
            sensitivity: 75,
            confidence_threshold: 60,
            store_capacity: DEFAULT_CAPACITY,
            live_interval: IntervalConfig::default(),
            histogram_interval: Duration::from_secs(5),
            stats_interval: Duration::from_secs(3),
            image_delay: DEFAULT_IMAGE_DELAY,
            video_delay: DEFAULT_VIDEO_DELAY,
            dwell_baseline: crate::core::stats::DEFAULT_DWELL_BASELINE,
            timezone: "UTC".to_string(),
            seed: None,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
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
            .join("retail-emotion-agent")
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

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensitivity > 100 {
            return Err(ConfigError::Invalid(format!(
                "sensitivity must be 0-100, got {}",
                self.sensitivity
            )));
        }
        if self.confidence_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be 0-100, got {}",
                self.confidence_threshold
            )));
        }
        if self.store_capacity == 0 {
            return Err(ConfigError::Invalid("store_capacity must be positive".into()));
        }
        if self.live_interval.min_ms > self.live_interval.max_ms {
            return Err(ConfigError::Invalid(format!(
                "live_interval min_ms ({}) exceeds max_ms ({})",
                self.live_interval.min_ms, self.live_interval.max_ms
            )));
        }
        if self.live_interval.max_ms == 0 {
            return Err(ConfigError::Invalid("live_interval max_ms must be positive".into()));
        }
        if self.histogram_interval.is_zero() || self.stats_interval.is_zero() {
            return Err(ConfigError::Invalid("timer intervals must be positive".into()));
        }
        if !self.dwell_baseline.is_finite() {
            return Err(ConfigError::Invalid("dwell_baseline must be finite".into()));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed display time zone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown time zone {:?}", self.timezone)))
    }

    /// Schedule of the live simulator.
    pub fn live_schedule(&self) -> Schedule {
        Schedule::jittered_ms(self.live_interval.min_ms, self.live_interval.max_ms)
    }
}

/// Millisecond bounds of a jittered interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            min_ms: DEFAULT_MIN_INTERVAL_MS,
            max_ms: DEFAULT_MAX_INTERVAL_MS,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration as milliseconds.
mod millis_serde {
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
        assert_eq!(config.sensitivity, 75);
        assert_eq!(config.confidence_threshold, 60);
        assert_eq!(config.store_capacity, 100);
        assert_eq!(config.histogram_interval, Duration::from_secs(5));
        assert_eq!(config.stats_interval, Duration::from_secs(3));
        assert_eq!(config.image_delay, Duration::from_secs(2));
        assert_eq!(config.video_delay, Duration::from_secs(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"sensitivity": 40, "seed": 9}"#).unwrap();
        assert_eq!(config.sensitivity, 40);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.confidence_threshold, 60);
        assert_eq!(config.live_interval, IntervalConfig::default());
    }

    #[test]
    fn test_duration_encoding() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["histogram_interval"], 5);
        assert_eq!(json["image_delay"], 2000);
        assert_eq!(json["live_interval"]["max_ms"], 5000);
    }

    #[test]
    fn test_validation_errors() {
        let config = Config {
            sensitivity: 101,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            live_interval: IntervalConfig {
                min_ms: 5_000,
                max_ms: 2_000,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            live_interval: IntervalConfig {
                min_ms: 0,
                max_ms: 0,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timezone_parsing() {
        let config = Config {
            timezone: "Europe/Berlin".to_string(),
            ..Default::default()
        };
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join("retail-emotion-config-test")
            .join(format!("{}.json", uuid::Uuid::new_v4()));
        let config = Config {
            confidence_threshold: 85,
            seed: Some(1),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.confidence_threshold, 85);
        assert_eq!(loaded.seed, Some(1));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("retail-emotion-missing").join("none.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sensitivity, 75);
    }
}
