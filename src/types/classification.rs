//! Sensor readings and classifier outputs.

use serde::{Deserialize, Serialize};

/// Number of scalar components contributed by one accelerometer reading.
pub const AXES_PER_READING: usize = 3;

/// One calibrated 3-axis reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Axes {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Divide every component by `divisor` (raw driver units → engineering units).
    pub fn scaled(self, divisor: f32) -> Self {
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
            z: self.z / divisor,
        }
    }

    /// Euclidean norm of the reading.
    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Confidence the classifier assigns to a single label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfidence {
    pub label: String,
    /// Score in [0, 1]
    pub value: f32,
}

/// Wall-clock cost of one classifier invocation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timing {
    pub dsp_ms: u64,
    pub classification_ms: u64,
    pub anomaly_ms: u64,
}

/// Output of one classifier invocation.
///
/// One entry per known class, in class-index order. `anomaly` is `None` when
/// the model has no anomaly block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classification: Vec<LabelConfidence>,
    pub anomaly: Option<f32>,
    #[serde(default)]
    pub timing: Timing,
}

impl ClassificationResult {
    /// Build a result from `(label, confidence)` pairs with no anomaly support.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f32)>) -> Self {
        Self {
            classification: pairs
                .into_iter()
                .map(|(label, value)| LabelConfidence {
                    label: label.into(),
                    value,
                })
                .collect(),
            anomaly: None,
            timing: Timing::default(),
        }
    }

    /// Attach an anomaly score.
    #[must_use]
    pub fn with_anomaly(mut self, score: f32) -> Self {
        self.anomaly = Some(score);
        self
    }

    /// Label with the highest raw confidence (diagnostics only, not used for voting).
    pub fn top_label(&self) -> Option<&LabelConfidence> {
        self.classification
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
    }
}
