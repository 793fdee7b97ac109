//! Applying observed job status to a run
//!
//! Every status the lifecycle observes, whatever its source, goes through
//! `apply_status`. It owns the stage machine rules:
//!
//! ```text
//! Confirm --start--> Running --completed--> Done
//!                       |  \--error-------> Failed
//!                       \--ceiling--------> Stalled --completed/error--> Done/Failed
//! ```
//!
//! Progress never moves backwards and terminal stages are never left here;
//! only a reset builds a fresh run.

use crate::types::{DiscoveryRun, Progress, RunStatus, Stage};

/// Shown when the backend reports an error without a message
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while searching for news";

/// Effect of applying one status to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The run does not accept updates in its current stage
    Rejected,
    /// Status carried nothing to apply
    Unchanged,
    /// Counters or the current item changed
    Progressed,
    Completed,
    Failed,
}

impl Transition {
    /// Whoever is driving the run should stop
    pub fn is_final(&self) -> bool {
        matches!(self, Transition::Rejected | Transition::Completed | Transition::Failed)
    }
}

/// Merge freshly observed counters into the current ones
///
/// `processed` is non-decreasing and never exceeds `total`. A zero total
/// means the source did not report one and the known total is kept.
pub fn merge_progress(current: Progress, incoming: Progress) -> Progress {
    let reported_total = if incoming.total == 0 { current.total } else { incoming.total };
    let total = reported_total.max(current.processed);
    let processed = current.processed.max(incoming.processed).min(total);
    Progress { processed, total }
}

/// Apply `status` to `run` and report what changed
pub fn apply_status(run: &mut DiscoveryRun, status: RunStatus) -> Transition {
    if !run.stage.accepts_updates() {
        return Transition::Rejected;
    }

    match status {
        RunStatus::Idle => Transition::Unchanged,
        RunStatus::Running { progress, current_item } => {
            let merged = merge_progress(run.progress, progress);
            if merged == run.progress && current_item == run.current_item {
                return Transition::Unchanged;
            }
            run.progress = merged;
            run.current_item = current_item;
            Transition::Progressed
        }
        RunStatus::Completed { progress, outcome } => {
            run.progress = merge_progress(run.progress, progress);
            run.outcome = Some(outcome);
            run.current_item = None;
            run.stage = Stage::Done;
            Transition::Completed
        }
        RunStatus::Failed { reason } => {
            let message = reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            run.error_message = Some(message);
            run.current_item = None;
            run.stage = Stage::Failed;
            Transition::Failed
        }
    }
}
