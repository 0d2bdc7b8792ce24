//! Bounded retry with exponential backoff at the sensor boundary.

use tracing::{debug, warn};

use super::AccelerometerSource;
use crate::config::SensorRetryConfig;
use crate::types::Axes;

/// Counters kept by [`RetryingSensor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    /// Successful reads
    pub reads: u64,
    /// Failed attempts that were retried
    pub retries: u64,
    /// Reads where every attempt failed and the last known-good value was used
    pub substitutions: u64,
}

/// Wraps a source so every read yields a value.
///
/// Each read makes up to `max_attempts` attempts, sleeping
/// `initial_backoff_ms × 2^(n-1)` (capped at `max_backoff_ms`) after the n-th
/// failure. When every attempt fails, the last known-good reading is
/// substituted (zeros before the first success).
pub struct RetryingSensor<S> {
    source: S,
    policy: SensorRetryConfig,
    last_good: Option<Axes>,
    stats: RetryStats,
}

impl<S: AccelerometerSource> RetryingSensor<S> {
    pub fn new(source: S, policy: SensorRetryConfig) -> Self {
        Self {
            source,
            policy,
            last_good: None,
            stats: RetryStats::default(),
        }
    }

    /// Read one value, retrying and substituting as needed. Never fails.
    pub async fn read(&mut self) -> Axes {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.source.read_axes() {
                Ok(axes) => {
                    self.last_good = Some(axes);
                    self.stats.reads += 1;
                    return axes;
                }
                Err(e) if attempt < attempts => {
                    self.stats.retries += 1;
                    let delay = self.policy.backoff(attempt);
                    debug!(
                        source = self.source.name(),
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Sensor read failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    warn!(
                        source = self.source.name(),
                        attempts,
                        error = %e,
                        "Sensor read exhausted retries — substituting last known-good reading"
                    );
                }
            }
        }

        self.stats.substitutions += 1;
        self.last_good.unwrap_or_default()
    }

    pub const fn stats(&self) -> RetryStats {
        self.stats
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}
