//! Classifier collaborator contract.
//!
//! The engine treats the model as an opaque function from one sample frame to
//! a `ClassificationResult`. Anything that can produce per-label confidences
//! (a linked inference library, a remote model, a scripted test double) plugs in
//! through [`Classifier`].

mod energy;

pub use energy::MotionEnergyClassifier;

use thiserror::Error;

use crate::types::ClassificationResult;

/// Frame length does not match what the model was built for.
pub const ERR_SIGNAL_SIZE_MISMATCH: i32 = -5;

/// Frame contains values the model cannot consume (NaN, infinity).
pub const ERR_INVALID_INPUT: i32 = -1;

/// Non-success status reported by a classifier invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("classifier returned {code}: {message}")]
pub struct ClassifierError {
    pub code: i32,
    pub message: String,
}

impl ClassifierError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Opaque model: one sample frame in, per-label confidences out.
///
/// `classify` is synchronous; the caller's task is busy for its full duration.
pub trait Classifier: Send {
    /// Labels in class-index order. Must match the order of
    /// `ClassificationResult::classification`.
    fn labels(&self) -> &[String];

    /// Whether results carry an anomaly score.
    fn has_anomaly(&self) -> bool;

    /// Classify one frame of `frame_size` scalars.
    fn classify(&mut self, samples: &[f32]) -> Result<ClassificationResult, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn labels(&self) -> &[String] {
        (**self).labels()
    }

    fn has_anomaly(&self) -> bool {
        (**self).has_anomaly()
    }

    fn classify(&mut self, samples: &[f32]) -> Result<ClassificationResult, ClassifierError> {
        (**self).classify(samples)
    }
}
