//! Processing Pipeline Module
//!
//! ## Task Architecture
//!
//! ```text
//! Ingestor   (every sampling.interval_ms)   sensor ─▶ retry ─▶ scale ─▶ window
//! Inference  (every smoothing.interval_ms)  window ─▶ classify ─▶ vote ─▶ channel
//! Reporter   (event-driven)                 channel ─▶ log / JSON lines
//! ```
//!
//! The window is the only state shared between Ingestor and Inference; the
//! history and histogram stay private to the engine.

mod inference;
mod ingestor;
mod reporter;
mod stats;
mod supervisor;
mod window;

pub use inference::{DecisionRecord, InferenceEngine, InferenceTask};
pub use ingestor::Ingestor;
pub use reporter::Reporter;
pub use stats::{PipelineCounters, PipelineStats};
pub use supervisor::{run_supervisor, TaskName};
pub use window::{shared_window, SampleWindow, WindowReader, WindowWriter};

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::acquisition::AccelerometerSource;
use crate::classifier::Classifier;
use crate::config::{defaults, DeviceConfig};
use crate::smoothing::ConfigurationError;

/// Output options for the reporter task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub emit_json: bool,
    pub max_cycles: Option<u64>,
}

/// All three tasks, wired together but not yet running.
pub struct Pipeline<S, C> {
    ingestor: Ingestor<S>,
    inference: InferenceTask<C>,
    reporter: Reporter,
    counters: Arc<PipelineCounters>,
}

impl<S, C> Pipeline<S, C>
where
    S: AccelerometerSource + 'static,
    C: Classifier + 'static,
{
    /// Build the window, engine and channel from one config.
    ///
    /// Fails if the frame geometry or smoothing thresholds are unusable, or
    /// if the classifier exposes no labels.
    pub fn new(
        config: &DeviceConfig,
        source: S,
        classifier: C,
        options: ReportOptions,
    ) -> Result<Self, ConfigurationError> {
        let (writer, reader) = shared_window(config.sampling.frame_size)?;
        let counters = Arc::new(PipelineCounters::new());
        let (tx, rx) = mpsc::channel(defaults::DECISION_CHANNEL_CAPACITY);

        let engine = InferenceEngine::new(classifier, reader, &config.smoothing)?;

        Ok(Self {
            ingestor: Ingestor::new(
                source,
                writer,
                config.sampling.clone(),
                config.sensor.clone(),
                Arc::clone(&counters),
            ),
            inference: InferenceTask::new(
                engine,
                config.smoothing.clone(),
                config.sampling.clone(),
                tx,
                Arc::clone(&counters),
            ),
            reporter: Reporter::new(rx, options.emit_json, options.max_cycles),
            counters,
        })
    }

    pub fn counters(&self) -> Arc<PipelineCounters> {
        Arc::clone(&self.counters)
    }

    /// Spawn every task into `task_set`. The reporter writes JSON lines to `out`.
    pub fn spawn<W>(
        self,
        task_set: &mut JoinSet<anyhow::Result<TaskName>>,
        cancel_token: &CancellationToken,
        out: W,
    ) where
        W: Write + Send + 'static,
    {
        let token = cancel_token.clone();
        let ingestor = self.ingestor;
        task_set.spawn(async move {
            ingestor.run(token).await;
            Ok(TaskName::Ingestor)
        });

        let token = cancel_token.clone();
        let inference = self.inference;
        task_set.spawn(async move {
            inference.run(token).await?;
            Ok(TaskName::Inference)
        });

        let token = cancel_token.clone();
        let reporter = self.reporter;
        task_set.spawn(async move {
            reporter.run(out, token).await?;
            Ok(TaskName::Reporter)
        });
    }
}
