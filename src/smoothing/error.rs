//! Error taxonomy for the window and the voting engine.

use thiserror::Error;

use crate::classifier::ClassifierError;

/// Invalid construction parameters. Detected once at start-up, never mid-run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Smoothing window must hold at least one reading")]
    EmptyWindow,

    #[error("min_readings_same ({threshold}) must be lower than readings ({readings})")]
    ThresholdNotBelowWindow { threshold: usize, readings: usize },

    #[error("Sample frame must hold at least one reading")]
    EmptyFrame,

    #[error("Frame size {frame_size} is not a multiple of {axes} axes")]
    FrameNotMultipleOfAxes { frame_size: usize, axes: usize },

    #[error("Model must expose at least one label")]
    NoLabels,
}

/// Failure of a single engine cycle. The cycle is skipped; history is untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("Classifier failure: {0}")]
    ClassifierFailure(#[from] ClassifierError),
}
