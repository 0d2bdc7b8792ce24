//! Sample Ingestor - periodic sensor reads into the shared window
//!
//! Runs on its own task at `sampling.interval_ms`. Each tick reads one value
//! through the retrying sensor, scales it from raw driver units and pushes it.
//! The ingestor never fails: sensor faults are absorbed by the retry layer.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::stats::PipelineCounters;
use super::window::WindowWriter;
use crate::acquisition::{AccelerometerSource, RetryingSensor};
use crate::config::{SamplingConfig, SensorRetryConfig};

pub struct Ingestor<S> {
    sensor: RetryingSensor<S>,
    writer: WindowWriter,
    sampling: SamplingConfig,
    counters: Arc<PipelineCounters>,
}

impl<S: AccelerometerSource> Ingestor<S> {
    pub fn new(
        source: S,
        writer: WindowWriter,
        sampling: SamplingConfig,
        retry: SensorRetryConfig,
        counters: Arc<PipelineCounters>,
    ) -> Self {
        Self {
            sensor: RetryingSensor::new(source, retry),
            writer,
            sampling,
            counters,
        }
    }

    /// Read, scale and push a single reading.
    pub async fn ingest_once(&mut self) {
        let raw = self.sensor.read().await;
        self.writer.push(raw.scaled(self.sampling.scale_divisor));

        let stats = self.sensor.stats();
        PipelineCounters::incr(&self.counters.readings_ingested);
        PipelineCounters::store(&self.counters.sensor_retries, stats.retries);
        PipelineCounters::store(&self.counters.sensor_substitutions, stats.substitutions);
    }

    /// Sample until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            source = self.sensor.source_name(),
            interval_ms = self.sampling.interval_ms,
            "[Ingestor] Task starting"
        );

        let mut interval = tokio::time::interval(self.sampling.interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Ingestor] Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    self.ingest_once().await;
                }
            }
        }

        let stats = self.sensor.stats();
        info!(
            reads = stats.reads,
            retries = stats.retries,
            substitutions = stats.substitutions,
            "[Ingestor] Task stopped"
        );
    }
}
