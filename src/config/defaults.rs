//! System-wide default constants.
//!
//! Centralises magic numbers used by the config defaults and the runtime.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "MOTION_CONSENSUS_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const CONFIG_FILE_NAME: &str = "motion_consensus.toml";

// ============================================================================
// Sampling
// ============================================================================

/// Scalars per classifier frame.
///
/// 375 = 125 readings × 3 axes, two seconds of data at 62.5 Hz.
pub const FRAME_SIZE: usize = 375;

/// Ingestor period (ms). 16 ms ≈ 62.5 Hz.
pub const SAMPLE_INTERVAL_MS: u64 = 16;

/// Raw driver units per engineering unit (readings are divided by this).
pub const RAW_SCALE_DIVISOR: f32 = 100.0;

// ============================================================================
// Smoothing
// ============================================================================

/// Number of per-cycle verdicts the decision is smoothed over (N).
///
/// 10 readings at 200 ms = 2 s of verdicts on top of the 2 s frame.
pub const SMOOTHEN_OVER_READINGS: usize = 10;

/// Votes a category must strictly exceed to be emitted (T = floor(0.7 × N)).
pub const MIN_READINGS_SAME: usize = 7;

/// Minimum per-class confidence for a cycle to vote for that class (C).
pub const CLASSIFIER_CONFIDENCE: f32 = 0.8;

/// Minimum anomaly score for a cycle to vote anomaly (A).
pub const ANOMALY_CONFIDENCE: f32 = 0.3;

/// Engine period (ms).
pub const INFERENCE_INTERVAL_MS: u64 = 200;

// ============================================================================
// Sensor Retry
// ============================================================================

/// Attempts per reading before the last known-good value is substituted.
pub const SENSOR_MAX_ATTEMPTS: u32 = 3;

/// Backoff before the second attempt (ms); doubles per attempt.
pub const SENSOR_INITIAL_BACKOFF_MS: u64 = 2;

/// Upper bound on a single backoff (ms).
pub const SENSOR_MAX_BACKOFF_MS: u64 = 20;

// ============================================================================
// Output
// ============================================================================

/// Capacity of the decision channel between the engine and the reporter.
pub const DECISION_CHANNEL_CAPACITY: usize = 64;
