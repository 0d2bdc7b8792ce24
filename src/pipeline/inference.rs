//! Inference Engine - periodic classify → vote → publish cycle
//!
//! ```text
//! snapshot window ─▶ classifier ─▶ verdict ─▶ history roll ─▶ histogram ─▶ Decision
//!                         │
//!                         └─ failure: cycle skipped, history untouched
//! ```
//!
//! The classifier call is synchronous, so the engine task is busy for its full
//! duration. Decisions are published with `try_send`; a slow consumer costs
//! dropped records, never a late cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::stats::PipelineCounters;
use super::window::WindowReader;
use crate::classifier::Classifier;
use crate::config::{SamplingConfig, SmoothingConfig};
use crate::smoothing::{ConfigurationError, CycleError, SmoothingEngine};
use crate::types::{Decision, EnginePhase, AXES_PER_READING};

// ============================================================================
// Decision Record
// ============================================================================

/// One published decision, as seen by downstream consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    /// 1-based count of successful cycles
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub phase: EnginePhase,
    pub decision: Decision,
}

// ============================================================================
// Engine
// ============================================================================

/// Owns the window reader, the classifier and the voting state.
pub struct InferenceEngine<C> {
    smoothing: SmoothingEngine,
    reader: WindowReader,
    classifier: C,
    /// Reused snapshot buffer, `frame_size` long
    frame: Vec<f32>,
    readings_per_frame: u64,
    timing_logged: bool,
    partial_frame_warned: bool,
}

impl<C: Classifier> InferenceEngine<C> {
    pub fn new(
        classifier: C,
        reader: WindowReader,
        config: &SmoothingConfig,
    ) -> Result<Self, ConfigurationError> {
        let smoothing = SmoothingEngine::new(classifier.labels().to_vec(), config)?;
        let frame_size = reader.frame_size();
        info!(
            labels = %smoothing.labels().join(", "),
            anomaly_block = classifier.has_anomaly(),
            readings = smoothing.window_size(),
            min_readings_same = smoothing.min_readings_same(),
            frame_size,
            "Inference engine ready"
        );
        if !classifier.has_anomaly() {
            info!("Classifier has no anomaly block; cycles never vote anomaly");
        }

        Ok(Self {
            smoothing,
            reader,
            classifier,
            frame: vec![0.0; frame_size],
            readings_per_frame: (frame_size / AXES_PER_READING) as u64,
            timing_logged: false,
            partial_frame_warned: false,
        })
    }

    /// Run one cycle.
    ///
    /// On classifier failure nothing is written to the history and the error
    /// is returned as-is; the cycle is not retried.
    pub fn on_cycle(&mut self) -> Result<Decision, CycleError> {
        let pushed = self.reader.snapshot_into(&mut self.frame);
        if pushed < self.readings_per_frame && !self.partial_frame_warned {
            self.partial_frame_warned = true;
            warn!(
                pushed,
                needed = self.readings_per_frame,
                "Cycle ran before the window filled; leading slots are zeros"
            );
        }

        let result = self.classifier.classify(&self.frame)?;
        debug!(
            top = ?result.top_label().map(|l| l.label.as_str()),
            anomaly = ?result.anomaly,
            "Frame classified"
        );

        if !self.timing_logged {
            self.timing_logged = true;
            info!(
                dsp_ms = result.timing.dsp_ms,
                classification_ms = result.timing.classification_ms,
                anomaly_ms = result.timing.anomaly_ms,
                "Classifier timing"
            );
        }

        Ok(self.smoothing.update(&result))
    }

    pub const fn smoothing(&self) -> &SmoothingEngine {
        &self.smoothing
    }

    pub fn phase(&self) -> EnginePhase {
        self.smoothing.phase()
    }
}

// ============================================================================
// Engine Task
// ============================================================================

/// Periodic driver around [`InferenceEngine`].
pub struct InferenceTask<C> {
    engine: InferenceEngine<C>,
    smoothing: SmoothingConfig,
    sampling: SamplingConfig,
    tx: mpsc::Sender<DecisionRecord>,
    counters: Arc<PipelineCounters>,
}

impl<C: Classifier> InferenceTask<C> {
    pub fn new(
        engine: InferenceEngine<C>,
        smoothing: SmoothingConfig,
        sampling: SamplingConfig,
        tx: mpsc::Sender<DecisionRecord>,
        counters: Arc<PipelineCounters>,
    ) -> Self {
        Self {
            engine,
            smoothing,
            sampling,
            tx,
            counters,
        }
    }

    /// Cycle until cancelled.
    ///
    /// Returns an error only when `max_consecutive_failures` is non-zero and
    /// that many cycles fail in a row.
    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!(
            interval_ms = self.smoothing.interval_ms,
            readings = self.smoothing.readings,
            min_readings_same = self.smoothing.min_readings_same,
            "[Inference] Task starting"
        );

        if self.smoothing.wait_for_full_frame {
            let warmup = self.sampling.full_frame_delay();
            info!(
                warmup_ms = warmup.as_millis() as u64,
                "[Inference] Waiting for first full frame"
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Inference] Shutdown signal received during warm-up");
                    return Ok(());
                }
                _ = tokio::time::sleep(warmup) => {}
            }
        }

        let mut interval = tokio::time::interval(self.smoothing.interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut consecutive_failures = 0u32;
        let mut cycle = 0u64;
        let mut phase = self.engine.phase();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Inference] Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {}
            }

            match self.engine.on_cycle() {
                Ok(decision) => {
                    consecutive_failures = 0;
                    cycle += 1;
                    PipelineCounters::incr(&self.counters.cycles_completed);

                    info!(
                        cycle,
                        decision = decision.label(),
                        histogram = %decision.histogram,
                        "{}",
                        decision
                    );

                    let now_phase = self.engine.phase();
                    if now_phase != phase {
                        info!(cycle, "✅ Smoothing history filled: {} → {}", phase, now_phase);
                        phase = now_phase;
                    }

                    self.publish(DecisionRecord {
                        cycle,
                        timestamp: Utc::now(),
                        phase: now_phase,
                        decision,
                    });
                }
                Err(e) => {
                    consecutive_failures += 1;
                    PipelineCounters::incr(&self.counters.cycles_skipped);
                    warn!(
                        error = %e,
                        consecutive_failures,
                        "[Inference] Cycle skipped"
                    );

                    let limit = self.smoothing.max_consecutive_failures;
                    if limit > 0 && consecutive_failures >= limit {
                        return Err(anyhow::anyhow!(
                            "classifier failed {} consecutive cycles (last: {})",
                            consecutive_failures,
                            e
                        ));
                    }
                }
            }
        }

        info!(cycles = cycle, "[Inference] Task stopped");
        Ok(())
    }

    fn publish(&self, record: DecisionRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                PipelineCounters::incr(&self.counters.records_dropped);
                debug!(cycle = record.cycle, "Decision channel full, record dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                PipelineCounters::incr(&self.counters.records_dropped);
            }
        }
    }
}
