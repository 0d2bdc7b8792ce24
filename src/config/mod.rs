//! Device Configuration Module
//!
//! Provides per-device configuration loaded from a TOML file: model labels,
//! sampling geometry, smoothing thresholds and sensor retry policy.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` CLI flag
//! 2. `MOTION_CONSENSUS_CONFIG` environment variable (path to TOML file)
//! 3. `motion_consensus.toml` in the current working directory
//! 4. Built-in defaults
//!
//! Configuration is read once at start-up and handed to each task by value;
//! nothing here is mutable at runtime.
//!
//! ```ignore
//! let config = DeviceConfig::load();
//! let engine = SmoothingEngine::new(config.model.labels.clone(), &config.smoothing)?;
//! ```

mod device_config;
pub mod defaults;
pub mod validation;

pub use device_config::*;
