//! Run-wide counters shared by the pipeline tasks.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters, updated by whichever task owns the event.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub readings_ingested: AtomicU64,
    pub sensor_retries: AtomicU64,
    pub sensor_substitutions: AtomicU64,
    pub cycles_completed: AtomicU64,
    pub cycles_skipped: AtomicU64,
    pub records_dropped: AtomicU64,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store(counter: &AtomicU64, value: u64) {
        counter.store(value, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            readings_ingested: self.readings_ingested.load(Ordering::Relaxed),
            sensor_retries: self.sensor_retries.load(Ordering::Relaxed),
            sensor_substitutions: self.sensor_substitutions.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub readings_ingested: u64,
    pub sensor_retries: u64,
    pub sensor_substitutions: u64,
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub records_dropped: u64,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline: {} readings ({} retries, {} substituted), {} cycles ({} skipped), {} records dropped",
            self.readings_ingested,
            self.sensor_retries,
            self.sensor_substitutions,
            self.cycles_completed,
            self.cycles_skipped,
            self.records_dropped
        )
    }
}
