//! Motion-energy classifier used when no trained model is linked in.
//!
//! Scores each frame by the standard deviation of per-reading acceleration
//! magnitude and matches it against configured per-label energy bands. Good
//! enough to drive the pipeline end-to-end against the simulator or a replay.

use std::time::Instant;

use tracing::debug;

use super::{Classifier, ClassifierError, ERR_INVALID_INPUT, ERR_SIGNAL_SIZE_MISMATCH};
use crate::config::ModelConfig;
use crate::types::{Axes, ClassificationResult, LabelConfidence, Timing, AXES_PER_READING};

/// Confidence given to the class whose band contains the frame energy.
const MATCH_CONFIDENCE: f32 = 0.95;

/// Total confidence spread over all classes when no band matches.
const NO_MATCH_MASS: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
struct Band {
    min: f32,
    max: f32,
}

impl Band {
    fn contains(self, energy: f32) -> bool {
        energy >= self.min && energy <= self.max
    }

    fn distance(self, energy: f32) -> f32 {
        if energy < self.min {
            self.min - energy
        } else if energy > self.max {
            energy - self.max
        } else {
            0.0
        }
    }
}

pub struct MotionEnergyClassifier {
    labels: Vec<String>,
    /// Indexed like `labels`; `None` for labels with no configured band
    bands: Vec<Option<Band>>,
    anomaly_supported: bool,
    frame_size: usize,
    /// Span from the lowest band edge to the highest, used to normalize anomaly scores
    band_span: f32,
}

impl MotionEnergyClassifier {
    pub fn from_config(model: &ModelConfig, frame_size: usize) -> Self {
        let bands: Vec<Option<Band>> = model
            .labels
            .iter()
            .map(|label| {
                model
                    .bands
                    .iter()
                    .find(|b| &b.label == label)
                    .map(|b| Band {
                        min: b.energy_min,
                        max: b.energy_max,
                    })
            })
            .collect();

        let lo = bands.iter().flatten().map(|b| b.min).fold(f32::INFINITY, f32::min);
        let hi = bands.iter().flatten().map(|b| b.max).fold(f32::NEG_INFINITY, f32::max);
        let band_span = if hi > lo { hi - lo } else { 1.0 };

        Self {
            labels: model.labels.clone(),
            bands,
            anomaly_supported: model.anomaly_supported,
            frame_size,
            band_span,
        }
    }

    /// Standard deviation of per-reading magnitude over the frame.
    fn frame_energy(samples: &[f32]) -> f32 {
        let magnitudes: Vec<f32> = samples
            .chunks_exact(AXES_PER_READING)
            .map(|c| Axes::new(c[0], c[1], c[2]).magnitude())
            .collect();
        if magnitudes.is_empty() {
            return 0.0;
        }
        let n = magnitudes.len() as f32;
        let mean = magnitudes.iter().sum::<f32>() / n;
        let var = magnitudes.iter().map(|m| (m - mean) * (m - mean)).sum::<f32>() / n;
        var.sqrt()
    }

    fn anomaly_score(&self, energy: f32) -> f32 {
        let nearest = self
            .bands
            .iter()
            .flatten()
            .map(|b| b.distance(energy))
            .fold(f32::INFINITY, f32::min);
        if nearest.is_finite() {
            (nearest / self.band_span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Classifier for MotionEnergyClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn has_anomaly(&self) -> bool {
        self.anomaly_supported
    }

    fn classify(&mut self, samples: &[f32]) -> Result<ClassificationResult, ClassifierError> {
        if samples.len() != self.frame_size {
            return Err(ClassifierError::new(
                ERR_SIGNAL_SIZE_MISMATCH,
                format!(
                    "frame has {} values, model expects {}",
                    samples.len(),
                    self.frame_size
                ),
            ));
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::new(
                ERR_INVALID_INPUT,
                "frame contains non-finite values",
            ));
        }

        let dsp_start = Instant::now();
        let energy = Self::frame_energy(samples);
        let dsp_ms = dsp_start.elapsed().as_millis() as u64;

        let cls_start = Instant::now();
        let matched = self
            .bands
            .iter()
            .position(|b| b.is_some_and(|b| b.contains(energy)));
        let count = self.labels.len() as f32;
        let classification = self
            .labels
            .iter()
            .enumerate()
            .map(|(ix, label)| {
                let value = match matched {
                    Some(m) if m == ix => MATCH_CONFIDENCE,
                    Some(_) if self.labels.len() > 1 => (1.0 - MATCH_CONFIDENCE) / (count - 1.0),
                    Some(_) => 0.0,
                    None => NO_MATCH_MASS / count,
                };
                LabelConfidence {
                    label: label.clone(),
                    value,
                }
            })
            .collect();
        let classification_ms = cls_start.elapsed().as_millis() as u64;

        let anomaly_start = Instant::now();
        let anomaly = self.anomaly_supported.then(|| {
            if matched.is_some() {
                0.0
            } else {
                self.anomaly_score(energy)
            }
        });
        let anomaly_ms = anomaly_start.elapsed().as_millis() as u64;

        debug!(energy, matched = ?matched, anomaly = ?anomaly, "Frame classified");

        Ok(ClassificationResult {
            classification,
            anomaly,
            timing: Timing {
                dsp_ms,
                classification_ms,
                anomaly_ms,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyBand;

    fn model() -> ModelConfig {
        ModelConfig {
            labels: vec!["idle".to_string(), "walk".to_string()],
            anomaly_supported: true,
            bands: vec![
                EnergyBand {
                    label: "idle".to_string(),
                    energy_min: 0.0,
                    energy_max: 0.05,
                },
                EnergyBand {
                    label: "walk".to_string(),
                    energy_min: 0.1,
                    energy_max: 0.6,
                },
            ],
        }
    }

    /// `readings` readings alternating between two magnitudes `lo`/`hi` on the z axis.
    fn frame(readings: usize, lo: f32, hi: f32) -> Vec<f32> {
        (0..readings)
            .flat_map(|i| [0.0, 0.0, if i % 2 == 0 { lo } else { hi }])
            .collect()
    }

    #[test]
    fn test_still_frame_is_idle() {
        let mut c = MotionEnergyClassifier::from_config(&model(), 30);
        let r = c.classify(&frame(10, 9.81, 9.81)).unwrap();
        assert_eq!(r.classification[0].value, MATCH_CONFIDENCE);
        assert_eq!(r.anomaly, Some(0.0));
    }

    #[test]
    fn test_moderate_motion_is_walk() {
        let mut c = MotionEnergyClassifier::from_config(&model(), 30);
        // std dev of alternating 9.5 / 10.1 is 0.3
        let r = c.classify(&frame(10, 9.5, 10.1)).unwrap();
        assert_eq!(r.classification[1].value, MATCH_CONFIDENCE);
        assert!(r.classification[0].value < 0.8);
    }

    #[test]
    fn test_violent_motion_is_anomalous() {
        let mut c = MotionEnergyClassifier::from_config(&model(), 30);
        let r = c.classify(&frame(10, 2.0, 18.0)).unwrap();
        assert!(r.classification.iter().all(|l| l.value < 0.8));
        assert_eq!(r.anomaly, Some(1.0));
    }

    #[test]
    fn test_wrong_frame_size_fails() {
        let mut c = MotionEnergyClassifier::from_config(&model(), 30);
        let err = c.classify(&[0.0; 27]).unwrap_err();
        assert_eq!(err.code, ERR_SIGNAL_SIZE_MISMATCH);
    }

    #[test]
    fn test_non_finite_input_fails() {
        let mut c = MotionEnergyClassifier::from_config(&model(), 3);
        let err = c.classify(&[0.0, f32::NAN, 1.0]).unwrap_err();
        assert_eq!(err.code, ERR_INVALID_INPUT);
    }

    #[test]
    fn test_no_anomaly_block_when_unsupported() {
        let mut m = model();
        m.anomaly_supported = false;
        let mut c = MotionEnergyClassifier::from_config(&m, 30);
        let r = c.classify(&frame(10, 2.0, 18.0)).unwrap();
        assert_eq!(r.anomaly, None);
        assert!(!c.has_anomaly());
    }
}
