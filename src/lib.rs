//! motion-consensus: debounced motion labels from a streaming accelerometer
//!
//! A frame classifier alone flickers at motion boundaries. This crate keeps a
//! rolling window of per-frame verdicts and only reports a label once a clear
//! majority of recent frames agree.
//!
//! ## Architecture
//!
//! - **Acquisition**: sensor boundary, retry with backoff, simulated and replay sources
//! - **Pipeline**: sample window, ingestor, inference engine, reporter, supervisor
//! - **Smoothing**: verdict mapping, decision history and consensus vote
//! - **Classifier**: model contract plus a built-in motion-energy classifier
//! - **Config**: TOML device configuration with validation

pub mod acquisition;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod smoothing;
pub mod types;

// Re-export device configuration
pub use config::{ConfigError, DeviceConfig, SmoothingConfig};

// Re-export commonly used types
pub use types::{
    Axes, ClassificationResult, Decision, DecisionCategory, EnginePhase, LabelConfidence,
    Timing, Verdict, VoteHistogram,
};

// Re-export the engine and its errors
pub use smoothing::{ConfigurationError, CycleError, SmoothingEngine};

// Re-export collaborator contracts
pub use acquisition::{AccelerometerSource, SensorError};
pub use classifier::{Classifier, ClassifierError, MotionEnergyClassifier};

// Re-export pipeline components
pub use pipeline::{
    DecisionRecord, InferenceEngine, Pipeline, PipelineStats, ReportOptions, SampleWindow,
};
