//! Sensor data acquisition module
//!
//! The accelerometer driver is an external collaborator; this module only
//! defines the boundary the ingestor reads through and a few sources that
//! satisfy it:
//!
//! - [`SimulatedAccelerometer`]: seeded synthetic motion (rest / walk / shake)
//! - [`ReplaySource`]: recorded `x,y,z` rows from a CSV file, looped
//! - [`RetryingSensor`]: bounded retry with backoff around any source

mod replay_source;
mod retry;
mod sensors;

pub use replay_source::ReplaySource;
pub use retry::{RetryStats, RetryingSensor};
pub use sensors::{Motion, SimulatedAccelerometer};

use thiserror::Error;

use crate::types::Axes;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Bus transaction failed: {0}")]
    Bus(String),

    #[error("Sensor read timed out")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Replay line {line}: {message}")]
    Replay { line: usize, message: String },
}

// ============================================================================
// Source Trait
// ============================================================================

/// Synchronous source of calibrated 3-axis readings, in raw driver units.
///
/// A failed read is reported as-is; retrying and substitution happen in
/// [`RetryingSensor`], never in the engine.
pub trait AccelerometerSource: Send {
    fn read_axes(&mut self) -> Result<Axes, SensorError>;

    /// Human-readable name for logging (e.g. "simulated", "replay").
    fn name(&self) -> &str;
}

impl<S: AccelerometerSource + ?Sized> AccelerometerSource for Box<S> {
    fn read_axes(&mut self) -> Result<Axes, SensorError> {
        (**self).read_axes()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
