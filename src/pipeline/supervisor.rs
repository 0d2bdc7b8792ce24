//! Task supervision: one `JoinSet`, one `CancellationToken`.
//!
//! Any task that returns an error or panics cancels the token, which stops
//! every other task at its next sleep point.

use std::fmt;

use anyhow::Result;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Task names for supervisor logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskName {
    Ingestor,
    Inference,
    Reporter,
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskName::Ingestor => write!(f, "Ingestor"),
            TaskName::Inference => write!(f, "Inference"),
            TaskName::Reporter => write!(f, "Reporter"),
        }
    }
}

/// Monitor tasks until all finish; cancel everything on the first failure.
///
/// Cancellation does not return early: tasks are drained so each one logs its
/// shutdown and releases its handles.
pub async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 Supervisor: All tasks spawned, monitoring...");
    let mut first_error: Option<anyhow::Error> = None;

    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => {
                info!("🔒 Supervisor: Task {} completed normally", task_name);
            }
            Ok(Err(e)) => {
                error!("🔒 Supervisor: Task failed with error: {:#}", e);
                cancel_token.cancel();
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!("🔒 Supervisor: Task panicked: {}", e);
                cancel_token.cancel();
                first_error.get_or_insert(anyhow::anyhow!("Task panicked: {}", e));
            }
        }
    }

    info!("🔒 Supervisor: All tasks completed");
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failure_cancels_siblings() {
        let cancel = CancellationToken::new();
        let mut set: JoinSet<Result<TaskName>> = JoinSet::new();

        let token = cancel.clone();
        set.spawn(async move {
            token.cancelled().await;
            Ok(TaskName::Ingestor)
        });
        set.spawn(async { Err(anyhow::anyhow!("boom")) });

        let result = run_supervisor(&mut set, cancel.clone()).await;
        assert!(result.is_err());
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_clean_completion() {
        let mut set: JoinSet<Result<TaskName>> = JoinSet::new();
        set.spawn(async { Ok(TaskName::Reporter) });
        assert!(run_supervisor(&mut set, CancellationToken::new()).await.is_ok());
    }
}
