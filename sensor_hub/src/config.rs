//! Hub configuration file.
//!
//! Everything here is optional: a missing `--config` yields
//! [`HubConfig::default`], which reproduces the built-in setup of three
//! counters at 10 ms, 100 ms and 1 s feeding capacity-2 mailboxes.

use sensor_common::config::{ConfigError, ConfigLoader, SharedConfig};
use sensor_common::consts::{
    DEFAULT_DRIVER, DEFAULT_ERROR_LOG_FILE, DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_LABEL_BOTTOM_MARGIN,
    DEFAULT_LABEL_LINE_SPACING, DEFAULT_LABEL_RIGHT_MARGIN, DEFAULT_LOG_DIR,
    DEFAULT_MAILBOX_CAPACITY, DEFAULT_SENSOR_PERIODS_MS,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}

fn default_join_timeout_ms() -> u64 {
    DEFAULT_JOIN_TIMEOUT_MS
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

fn default_sensors() -> Vec<SensorConfig> {
    DEFAULT_SENSOR_PERIODS_MS
        .iter()
        .enumerate()
        .map(|(idx, &period_ms)| SensorConfig {
            name: format!("Sensor {}", idx + 1),
            period_ms,
        })
        .collect()
}

/// Top-level hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Entries retained per mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Time granted to producer threads to exit after shutdown.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,

    /// Capture backend, overridable with `--driver`.
    #[serde(default = "default_driver")]
    pub driver: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Counter sensors, in label order.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,

    /// Per-driver tables, keyed by driver name.
    #[serde(default)]
    pub driver_config: HashMap<String, toml::Table>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            driver: default_driver(),
            logging: LoggingConfig::default(),
            overlay: OverlayConfig::default(),
            sensors: default_sensors(),
            driver_config: HashMap::new(),
        }
    }
}

impl HubConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {:?}", path);
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `shared` is valid
    /// 2. `mailbox_capacity` > 0
    /// 3. at least one sensor, every `period_ms` > 0
    /// 4. sensor names non-empty and unique
    /// 5. `driver` and `logging.error_file` non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.mailbox_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "mailbox_capacity must be greater than 0".to_string(),
            ));
        }

        if self.sensors.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one sensor is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for sensor in &self.sensors {
            if sensor.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "sensor name cannot be empty".to_string(),
                ));
            }
            if sensor.period_ms == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "sensor '{}': period_ms must be greater than 0",
                    sensor.name
                )));
            }
            if !names.insert(&sensor.name) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate sensor name: {}",
                    sensor.name
                )));
            }
        }

        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "driver cannot be empty".to_string(),
            ));
        }

        if self.logging.error_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.error_file cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Table for `driver`, if configured.
    pub fn driver_table(&self, driver: &str) -> Option<&toml::Table> {
        self.driver_config.get(driver)
    }
}

/// One synthetic counter sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    /// Label shown in the overlay.
    pub name: String,

    /// Sampling period in milliseconds.
    pub period_ms: u64,
}

impl SensorConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

fn default_error_file() -> PathBuf {
    PathBuf::from(DEFAULT_ERROR_LOG_FILE)
}

/// Error log location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Directory created at startup if missing.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// File inside `dir` receiving error events.
    #[serde(default = "default_error_file")]
    pub error_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            error_file: default_error_file(),
        }
    }
}

impl LoggingConfig {
    pub fn error_log_path(&self) -> PathBuf {
        self.dir.join(&self.error_file)
    }
}

fn default_right_margin() -> u32 {
    DEFAULT_LABEL_RIGHT_MARGIN
}

fn default_bottom_margin() -> u32 {
    DEFAULT_LABEL_BOTTOM_MARGIN
}

fn default_line_spacing() -> u32 {
    DEFAULT_LABEL_LINE_SPACING
}

/// Placement of the sensor labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayConfig {
    #[serde(default = "default_right_margin")]
    pub right_margin: u32,

    #[serde(default = "default_bottom_margin")]
    pub bottom_margin: u32,

    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            right_margin: DEFAULT_LABEL_RIGHT_MARGIN,
            bottom_margin: DEFAULT_LABEL_BOTTOM_MARGIN,
            line_spacing: DEFAULT_LABEL_LINE_SPACING,
        }
    }
}
