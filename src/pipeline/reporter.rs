//! Reporter - drains published decisions
//!
//! With JSON output enabled every record is written as one `serde_json` line.
//! An optional decision budget cancels the whole pipeline once reached.

use std::io::Write;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::inference::DecisionRecord;

pub struct Reporter {
    rx: mpsc::Receiver<DecisionRecord>,
    emit_json: bool,
    /// Cancel the pipeline after this many records (None = unbounded)
    max_cycles: Option<u64>,
    /// Last category label seen, for change logging
    last_label: Option<String>,
}

impl Reporter {
    pub fn new(rx: mpsc::Receiver<DecisionRecord>, emit_json: bool, max_cycles: Option<u64>) -> Self {
        Self {
            rx,
            emit_json,
            max_cycles,
            last_label: None,
        }
    }

    /// Drain until the channel closes or the budget is reached. Returns records seen.
    pub async fn run<W: Write>(mut self, mut out: W, cancel: CancellationToken) -> anyhow::Result<u64> {
        info!(emit_json = self.emit_json, "[Reporter] Task starting");
        let mut seen = 0u64;

        while let Some(record) = self.rx.recv().await {
            seen += 1;

            let label = record.decision.label();
            if self.last_label.as_deref() != Some(label) {
                if let Some(prev) = &self.last_label {
                    info!(cycle = record.cycle, "🔄 Decision changed: {} → {}", prev, label);
                }
                self.last_label = Some(label.to_string());
            }

            if self.emit_json {
                serde_json::to_writer(&mut out, &record)?;
                writeln!(out)?;
                out.flush()?;
            }

            if self.max_cycles.is_some_and(|max| seen >= max) {
                info!(records = seen, "[Reporter] Decision budget reached, stopping pipeline");
                cancel.cancel();
                break;
            }
        }

        if seen == 0 {
            warn!("[Reporter] No decisions were published");
        }
        info!(records = seen, "[Reporter] Task stopped");
        Ok(seen)
    }
}
