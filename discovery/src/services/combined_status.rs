//! One status view over several backend jobs
//!
//! Used when resource and manufacturer discovery run side by side and the
//! caller follows them as a single run. Status endpoints keep reporting the
//! last final state of a job long after it ended, so only jobs seen running
//! while this source follows them count towards the result.

use std::sync::{Arc, Mutex, PoisonError};
use async_trait::async_trait;

use crate::error::DiscoveryResult;
use crate::traits::StatusSource;
use crate::types::{Outcome, Progress, RunStatus};

pub struct CombinedStatusSource {
    sources: Vec<Arc<dyn StatusSource>>,
    seen_running: Mutex<Vec<bool>>,
}

impl CombinedStatusSource {
    pub fn new(sources: Vec<Arc<dyn StatusSource>>) -> Self {
        let seen_running = Mutex::new(vec![false; sources.len()]);
        Self { sources, seen_running }
    }
}

/// Fold individual statuses into one
///
/// `seen_running[i]` tells whether job `i` was observed running. While any
/// job runs the combination runs, with the counters of the running jobs
/// summed. Once nothing runs the combination is final: a failure of a job
/// seen running wins, otherwise it completes with the outcomes of the jobs
/// seen running summed. Final states of jobs never seen running are stale
/// and ignored, so when nothing ran at all the result is an empty
/// completion.
pub fn combine_statuses(statuses: &[RunStatus], seen_running: &[bool]) -> RunStatus {
    let mut running: Option<(Progress, Option<String>)> = None;
    let mut failure: Option<Option<String>> = None;
    let mut progress = Progress::default();
    let mut outcome = Outcome::default();

    for (index, status) in statuses.iter().enumerate() {
        let seen = seen_running.get(index).copied().unwrap_or(false);
        match status {
            RunStatus::Idle => {}
            RunStatus::Running { progress, current_item } => {
                let (sum, item) = running.get_or_insert((Progress::default(), None));
                sum.processed += progress.processed;
                sum.total += progress.total;
                if item.is_none() {
                    *item = current_item.clone();
                }
            }
            RunStatus::Failed { reason } if seen => {
                if failure.as_ref().map_or(true, Option::is_none) {
                    failure = Some(reason.clone());
                }
            }
            RunStatus::Completed { progress: done, outcome: result } if seen => {
                progress.processed += done.processed;
                progress.total += done.total;
                outcome.created += result.created;
                outcome.errors += result.errors;
                outcome.total_processed += result.total_processed;
            }
            RunStatus::Failed { .. } | RunStatus::Completed { .. } => {}
        }
    }

    if let Some((progress, current_item)) = running {
        return RunStatus::Running { progress, current_item };
    }
    if let Some(reason) = failure {
        return RunStatus::Failed { reason };
    }
    RunStatus::Completed { progress, outcome }
}

#[async_trait]
impl StatusSource for CombinedStatusSource {
    async fn fetch_status(&self) -> DiscoveryResult<RunStatus> {
        let mut statuses = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            statuses.push(source.fetch_status().await?);
        }

        let mut seen_running = self.seen_running.lock().unwrap_or_else(PoisonError::into_inner);
        for (seen, status) in seen_running.iter_mut().zip(&statuses) {
            if matches!(status, RunStatus::Running { .. }) {
                *seen = true;
            }
        }
        let combined = combine_statuses(&statuses, &seen_running);

        // A settled combination starts the next follow from scratch
        if !matches!(combined, RunStatus::Running { .. }) {
            seen_running.iter_mut().for_each(|seen| *seen = false);
        }
        Ok(combined)
    }
}
