//! Configuration module for the dummy device
//!
//! The device is configured from a TOML file. Every field has a default, so
//! an empty file (or no file at all) yields the stock device layout:
//!
//! ```toml
//! application_name = "libera-dummy"
//! poll_interval_ms = 1000
//! timing_board = "evrx2"
//! raf_boards = ["raf5"]
//!
//! [signals]
//! adc_rate_hz = 10000.0
//! stream_rate_hz = 10.0
//! decimation = 64
//! frequency_hz = 50.0
//! amplitude = 20000.0
//! samples_per_poll = 64
//! max_samples_per_read = 65536
//!
//! [interlock]
//! overflow_threshold = 30000
//! overflow_duration = 5
//! ```
//!
//! Persisting the registry contents themselves is left to the host.

use crate::error::{DeviceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default application name
pub const APPLICATION_NAME: &str = "libera-dummy";

/// Default status polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default upper bound on the samples a single signal read may request
pub const DEFAULT_MAX_SAMPLES_PER_READ: usize = 65_536;

/// Default ADC overflow threshold (raw counts)
pub const DEFAULT_OVERFLOW_THRESHOLD: u32 = 30_000;

/// Top-level device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name reported by the application
    pub application_name: String,

    /// Period of the background status sampling in milliseconds
    pub poll_interval_ms: u64,

    /// Name of the timing board subtree
    pub timing_board: String,

    /// Names of the RAF (acquisition) board subtrees
    pub raf_boards: Vec<String>,

    /// Simulated signal settings
    pub signals: SignalSettings,

    /// Interlock settings
    pub interlock: InterlockSettings,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            application_name: APPLICATION_NAME.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timing_board: "evrx2".to_string(),
            raf_boards: vec!["raf5".to_string()],
            signals: SignalSettings::default(),
            interlock: InterlockSettings::default(),
        }
    }
}

impl DeviceConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeviceError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| e.with_context(format!("Loading {:?}", path)))
    }

    /// Load a configuration file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DeviceError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DeviceError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check invariants the lifecycle relies on
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(DeviceError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        let mut names: Vec<&str> = Vec::with_capacity(self.raf_boards.len() + 1);
        for name in std::iter::once(&self.timing_board).chain(&self.raf_boards) {
            if name.is_empty() || name.contains('/') {
                return Err(DeviceError::Config(format!(
                    "Invalid board name '{}'",
                    name
                )));
            }
            if names.contains(&name.as_str()) {
                return Err(DeviceError::Config(format!(
                    "Duplicate board name '{}'",
                    name
                )));
            }
            names.push(name.as_str());
        }
        self.signals.validate()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Settings for the simulated signal sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    /// ADC sample rate in Hz
    pub adc_rate_hz: f64,

    /// Slow acquisition stream rate in Hz
    pub stream_rate_hz: f64,

    /// Decimation from ADC to DDC rate
    pub decimation: u32,

    /// Frequency of the simulated beam signal in Hz
    pub frequency_hz: f64,

    /// Peak amplitude of the simulated signals (raw counts)
    pub amplitude: f64,

    /// ADC samples inspected per status poll
    pub samples_per_poll: usize,

    /// Largest sample count a single read may request
    pub max_samples_per_read: usize,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            adc_rate_hz: 10_000.0,
            stream_rate_hz: 10.0,
            decimation: 64,
            frequency_hz: 50.0,
            amplitude: 20_000.0,
            samples_per_poll: 64,
            max_samples_per_read: DEFAULT_MAX_SAMPLES_PER_READ,
        }
    }
}

impl SignalSettings {
    fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("adc_rate_hz", self.adc_rate_hz),
            ("stream_rate_hz", self.stream_rate_hz),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(DeviceError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, rate
                )));
            }
        }
        if self.decimation == 0 {
            return Err(DeviceError::Config(
                "decimation must be greater than zero".to_string(),
            ));
        }
        if self.samples_per_poll > self.max_samples_per_read {
            return Err(DeviceError::Config(format!(
                "samples_per_poll ({}) exceeds max_samples_per_read ({})",
                self.samples_per_poll, self.max_samples_per_read
            )));
        }
        Ok(())
    }
}

/// Interlock limits seeded into the registry and used by status sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterlockSettings {
    /// ADC magnitude above which `adc_overflow` is raised
    pub overflow_threshold: u32,

    /// Overflow duration limit (ADC samples)
    pub overflow_duration: u32,
}

impl Default for InterlockSettings {
    fn default() -> Self {
        Self {
            overflow_threshold: DEFAULT_OVERFLOW_THRESHOLD,
            overflow_duration: 5,
        }
    }
}
