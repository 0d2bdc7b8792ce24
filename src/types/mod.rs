//! Shared data structures for the sample → classify → vote pipeline
//!
//! This module defines the core types that flow between the two tasks:
//! - Ingestion: `Axes` (one calibrated 3-axis accelerometer reading)
//! - Classification: `ClassificationResult` (per-label confidences, optional anomaly score)
//! - Voting: `Verdict` (one cycle's raw outcome) and `VoteHistogram`
//! - Output: `Decision` (the debounced label plus the histogram it was drawn from)

mod classification;
mod decision;

pub use classification::*;
pub use decision::*;
