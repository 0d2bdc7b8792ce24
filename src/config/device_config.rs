//! Device Configuration - model, sampling, smoothing and sensor settings as TOML
//!
//! Every section implements `Default` with the reference device constants,
//! so a missing or empty config file reproduces the stock behaviour.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::types::AXES_PER_READING;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one sensing device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device identification
    #[serde(default)]
    pub device: DeviceInfo,

    /// Classifier labels and the built-in classifier's energy bands
    #[serde(default)]
    pub model: ModelConfig,

    /// Sample window geometry and ingestor period
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Voting thresholds and engine period
    #[serde(default)]
    pub smoothing: SmoothingConfig,

    /// Retry policy at the sensor boundary
    #[serde(default)]
    pub sensor: SensorRetryConfig,
}

impl DeviceConfig {
    /// Config file selected by the standard search order:
    /// 1. `$MOTION_CONSENSUS_CONFIG` (used even if the file is missing)
    /// 2. `./motion_consensus.toml` when it exists
    ///
    /// `None` means built-in defaults.
    pub fn resolve_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        local.exists().then_some(local)
    }

    /// Load configuration from the path chosen by [`Self::resolve_path`],
    /// or built-in defaults when there is none.
    ///
    /// A selected file that cannot be read, parsed or validated is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::resolve_path() {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                info!(path = %path.display(), device = %config.device.name, "Loaded device config");
                Ok(config)
            }
            None => {
                info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents, path)
    }

    /// Parse and validate TOML text. `origin` only labels error messages.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section, collecting all violations.
    ///
    /// Rules:
    /// - smoothing window non-empty, threshold strictly below it
    /// - frame size a non-zero multiple of 3
    /// - confidences finite and within [0, 1]
    /// - engine period no shorter than the ingestor period
    /// - labels non-empty and unique; bands reference known labels
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        // Smoothing window
        let s = &self.smoothing;
        if s.readings == 0 {
            errors.push("smoothing.readings must be > 0".to_string());
        } else if s.min_readings_same >= s.readings {
            errors.push(format!(
                "smoothing.min_readings_same ({}) must be < readings ({})",
                s.min_readings_same, s.readings
            ));
        }
        Self::check_unit_interval(s.classifier_confidence, "smoothing.classifier_confidence", &mut errors);
        Self::check_unit_interval(s.anomaly_confidence, "smoothing.anomaly_confidence", &mut errors);

        // Sampling geometry
        let f = &self.sampling;
        if f.frame_size == 0 {
            errors.push("sampling.frame_size must be > 0".to_string());
        } else if f.frame_size % AXES_PER_READING != 0 {
            errors.push(format!(
                "sampling.frame_size ({}) must be a multiple of {}",
                f.frame_size, AXES_PER_READING
            ));
        }
        if !f.scale_divisor.is_finite() || f.scale_divisor == 0.0 {
            errors.push(format!(
                "sampling.scale_divisor must be finite and non-zero (got {})",
                f.scale_divisor
            ));
        }

        // Periods
        if f.interval_ms == 0 {
            errors.push("sampling.interval_ms must be > 0".to_string());
        }
        if s.interval_ms < f.interval_ms {
            errors.push(format!(
                "smoothing.interval_ms ({}) must be >= sampling.interval_ms ({})",
                s.interval_ms, f.interval_ms
            ));
        }

        // Model labels
        let m = &self.model;
        if m.labels.is_empty() {
            errors.push("model.labels must contain at least one label".to_string());
        }
        let mut seen = HashSet::new();
        for label in &m.labels {
            if !seen.insert(label.as_str()) {
                errors.push(format!("model.labels contains duplicate label '{label}'"));
            }
        }
        for band in &m.bands {
            if !seen.contains(band.label.as_str()) {
                errors.push(format!(
                    "model.bands references unknown label '{}'",
                    band.label
                ));
            }
            if !band.energy_min.is_finite() || !band.energy_max.is_finite() {
                errors.push(format!("model.bands '{}': edges must be finite", band.label));
            } else if band.energy_min >= band.energy_max {
                errors.push(format!(
                    "model.bands '{}': energy_min ({:.3}) must be < energy_max ({:.3})",
                    band.label, band.energy_min, band.energy_max
                ));
            }
        }

        // Sensor retry
        let r = &self.sensor;
        if r.max_attempts == 0 {
            errors.push("sensor.max_attempts must be > 0".to_string());
        }
        if r.initial_backoff_ms > r.max_backoff_ms {
            errors.push(format!(
                "sensor.initial_backoff_ms ({}) must be <= max_backoff_ms ({})",
                r.initial_backoff_ms, r.max_backoff_ms
            ));
        }

        for w in super::validation::validate_ranges(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_unit_interval(value: f32, name: &str, errors: &mut Vec<String>) {
        // NaN fails every comparison, so check finiteness first
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            errors.push(format!("{name} must be within [0, 1] (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Device Info
// ============================================================================

/// Identification metadata, only used in logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "accel-node".to_string()
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            name: default_device_name(),
        }
    }
}

// ============================================================================
// Model Config
// ============================================================================

/// Labels exposed by the classifier, in class-index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Whether results carry an anomaly score
    #[serde(default = "default_anomaly_supported")]
    pub anomaly_supported: bool,

    /// Motion-energy bands for the built-in classifier (engineering units).
    #[serde(default = "default_bands")]
    pub bands: Vec<EnergyBand>,
}

/// Inclusive range of frame energy that maps to one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBand {
    pub label: String,
    pub energy_min: f32,
    pub energy_max: f32,
}

fn default_labels() -> Vec<String> {
    vec!["idle".to_string(), "walk".to_string()]
}
fn default_anomaly_supported() -> bool { true }
fn default_bands() -> Vec<EnergyBand> {
    vec![
        EnergyBand {
            label: "idle".to_string(),
            energy_min: 0.0,
            energy_max: 0.08,
        },
        EnergyBand {
            label: "walk".to_string(),
            energy_min: 0.15,
            energy_max: 2.5,
        },
    ]
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            anomaly_supported: default_anomaly_supported(),
            bands: default_bands(),
        }
    }
}

// ============================================================================
// Sampling Config
// ============================================================================

/// Sample window geometry and ingestor period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Scalars per frame (F). Must be a multiple of 3.
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Ingestor period in milliseconds
    #[serde(default = "default_sample_interval_ms")]
    pub interval_ms: u64,

    /// Raw readings are divided by this before entering the window
    #[serde(default = "default_scale_divisor")]
    pub scale_divisor: f32,
}

fn default_frame_size() -> usize { defaults::FRAME_SIZE }
fn default_sample_interval_ms() -> u64 { defaults::SAMPLE_INTERVAL_MS }
fn default_scale_divisor() -> f32 { defaults::RAW_SCALE_DIVISOR }

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            interval_ms: default_sample_interval_ms(),
            scale_divisor: default_scale_divisor(),
        }
    }
}

impl SamplingConfig {
    /// Readings needed to fill one frame.
    pub const fn readings_per_frame(&self) -> usize {
        self.frame_size / AXES_PER_READING
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Time the ingestor needs to fill the window once.
    pub fn full_frame_delay(&self) -> Duration {
        Duration::from_millis(self.interval_ms.saturating_mul(self.readings_per_frame() as u64))
    }
}

// ============================================================================
// Smoothing Config
// ============================================================================

/// Voting thresholds. Immutable for the engine's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Verdicts kept in the history window (N)
    #[serde(default = "default_readings")]
    pub readings: usize,

    /// Votes a category must strictly exceed to be emitted (T < N)
    #[serde(default = "default_min_readings_same")]
    pub min_readings_same: usize,

    /// Minimum class confidence for a cycle to vote for the class (C)
    #[serde(default = "default_classifier_confidence")]
    pub classifier_confidence: f32,

    /// Minimum anomaly score for a cycle to vote anomaly (A)
    #[serde(default = "default_anomaly_confidence")]
    pub anomaly_confidence: f32,

    /// Engine period in milliseconds
    #[serde(default = "default_inference_interval_ms")]
    pub interval_ms: u64,

    /// Delay the first cycle until the ingestor has filled one frame
    #[serde(default = "default_wait_for_full_frame")]
    pub wait_for_full_frame: bool,

    /// Stop the engine after this many consecutive classifier failures (0 = never)
    #[serde(default)]
    pub max_consecutive_failures: u32,
}

fn default_readings() -> usize { defaults::SMOOTHEN_OVER_READINGS }
fn default_min_readings_same() -> usize { defaults::MIN_READINGS_SAME }
fn default_classifier_confidence() -> f32 { defaults::CLASSIFIER_CONFIDENCE }
fn default_anomaly_confidence() -> f32 { defaults::ANOMALY_CONFIDENCE }
fn default_inference_interval_ms() -> u64 { defaults::INFERENCE_INTERVAL_MS }
fn default_wait_for_full_frame() -> bool { true }

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            readings: default_readings(),
            min_readings_same: default_min_readings_same(),
            classifier_confidence: default_classifier_confidence(),
            anomaly_confidence: default_anomaly_confidence(),
            interval_ms: default_inference_interval_ms(),
            wait_for_full_frame: default_wait_for_full_frame(),
            max_consecutive_failures: 0,
        }
    }
}

impl SmoothingConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// ============================================================================
// Sensor Retry Config
// ============================================================================

/// Bounded retry with exponential backoff around each sensor read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorRetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 { defaults::SENSOR_MAX_ATTEMPTS }
fn default_initial_backoff_ms() -> u64 { defaults::SENSOR_INITIAL_BACKOFF_MS }
fn default_max_backoff_ms() -> u64 { defaults::SENSOR_MAX_BACKOFF_MS }

impl Default for SensorRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl SensorRetryConfig {
    /// Delay before retry number `attempt` (1-based count of failures so far).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
