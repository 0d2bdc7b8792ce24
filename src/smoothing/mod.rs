//! Consensus Voting Module - Debounced labels from noisy per-frame classifications
//!
//! A single classifier frame can overlap the tail of one motion and the head of
//! another, so one confident frame is not trusted on its own. The engine keeps
//! the last N per-cycle verdicts and only commits to a label when more than T
//! of them agree (e.g. 8 of 10).
//!
//! ## Per-cycle verdict
//!
//! - anomaly score ≥ A → `Anomaly` (wins over any class)
//! - else the last class in index order whose confidence ≥ C
//! - else `Uncertain`
//!
//! ## Decision
//!
//! The category with the most votes wins (ties go to the lower category index,
//! classes before `Uncertain` before `Anomaly`). It is only emitted when its
//! count is strictly greater than T; otherwise the decision is `Uncertain`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SmoothingEngine::new(labels, &config.smoothing)?;
//! let decision = engine.update(&classifier.classify(&frame)?);
//! println!("{decision}"); // "walk [ 1, 9, 0, 0 ]"
//! ```

mod error;

pub use error::{ConfigurationError, CycleError};

use std::collections::VecDeque;

use crate::config::SmoothingConfig;
use crate::types::{ClassificationResult, Decision, DecisionCategory, EnginePhase, Verdict, VoteHistogram};

/// Rolling decision history plus the voting policy applied to it.
#[derive(Debug, Clone)]
pub struct SmoothingEngine {
    labels: Vec<String>,
    min_readings_same: usize,
    classifier_confidence: f32,
    anomaly_confidence: f32,
    /// Oldest verdict at the front, newest at the back; always exactly N long
    history: VecDeque<Verdict>,
    recorded: u64,
}

impl SmoothingEngine {
    /// Create an engine whose history starts as N `Uncertain` votes.
    pub fn new(labels: Vec<String>, config: &SmoothingConfig) -> Result<Self, ConfigurationError> {
        if config.readings == 0 {
            return Err(ConfigurationError::EmptyWindow);
        }
        if config.min_readings_same >= config.readings {
            return Err(ConfigurationError::ThresholdNotBelowWindow {
                threshold: config.min_readings_same,
                readings: config.readings,
            });
        }
        if labels.is_empty() {
            return Err(ConfigurationError::NoLabels);
        }

        Ok(Self {
            labels,
            min_readings_same: config.min_readings_same,
            classifier_confidence: config.classifier_confidence,
            anomaly_confidence: config.anomaly_confidence,
            history: std::iter::repeat(Verdict::Uncertain)
                .take(config.readings)
                .collect(),
            recorded: 0,
        })
    }

    /// Map one classifier result to this cycle's verdict.
    ///
    /// Every class at or above the confidence threshold overwrites the
    /// candidate, so when two classes qualify the higher index wins.
    pub fn verdict_for(&self, result: &ClassificationResult) -> Verdict {
        let mut verdict = Verdict::Uncertain;

        for (ix, entry) in result
            .classification
            .iter()
            .take(self.labels.len())
            .enumerate()
        {
            if entry.value >= self.classifier_confidence {
                verdict = Verdict::Class(ix);
            }
        }

        if let Some(score) = result.anomaly {
            if score >= self.anomaly_confidence {
                verdict = Verdict::Anomaly;
            }
        }

        verdict
    }

    /// Record the verdict for `result` and return the smoothed decision.
    pub fn update(&mut self, result: &ClassificationResult) -> Decision {
        let verdict = self.verdict_for(result);
        self.record(verdict)
    }

    /// Roll the history by one, append `verdict`, and re-run the vote.
    pub fn record(&mut self, verdict: Verdict) -> Decision {
        self.history.pop_front();
        self.history.push_back(verdict);
        self.recorded += 1;

        let histogram = self.histogram();
        let category = self.decide(&histogram);
        Decision { category, histogram }
    }

    /// Vote counts over the current history.
    pub fn histogram(&self) -> VoteHistogram {
        let mut histogram = VoteHistogram::new(self.labels.len());
        for &verdict in &self.history {
            histogram.record(verdict);
        }
        histogram
    }

    fn decide(&self, histogram: &VoteHistogram) -> DecisionCategory {
        let mut top = Verdict::Uncertain;
        let mut top_count = 0;
        for (category, count) in histogram.categories() {
            if count > top_count {
                top = category;
                top_count = count;
            }
        }

        if top_count <= self.min_readings_same {
            return DecisionCategory::Uncertain;
        }

        match top {
            Verdict::Class(index) => match self.labels.get(index) {
                Some(label) => DecisionCategory::Class {
                    index,
                    label: label.clone(),
                },
                None => DecisionCategory::Uncertain,
            },
            Verdict::Uncertain => DecisionCategory::Uncertain,
            Verdict::Anomaly => DecisionCategory::Anomaly,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        if self.recorded < self.history.len() as u64 {
            EnginePhase::Filling
        } else {
            EnginePhase::Steady
        }
    }

    /// History contents, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = Verdict> + '_ {
        self.history.iter().copied()
    }

    /// Number of verdicts recorded since construction (skipped cycles excluded).
    pub const fn recorded_cycles(&self) -> u64 {
        self.recorded
    }

    pub fn window_size(&self) -> usize {
        self.history.len()
    }

    pub const fn min_readings_same(&self) -> usize {
        self.min_readings_same
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// ============================================================================
// Tests
// ============================================================================
