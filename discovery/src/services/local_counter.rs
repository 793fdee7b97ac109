//! Status source fed by a sequential sweep

use std::sync::{Mutex, MutexGuard, PoisonError};
use async_trait::async_trait;

use crate::error::DiscoveryResult;
use crate::traits::StatusSource;
use crate::types::{Outcome, Progress, RunStatus};

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    processed: u64,
    successful: u64,
    failed: u64,
    current_item: Option<String>,
}

/// Client-side counters of a sequential run
///
/// The sweep records each per-item result here and the lifecycle reads it
/// back through `StatusSource`, the same way it reads a backend job.
#[derive(Debug)]
pub struct LocalCounterSource {
    counters: Mutex<Counters>,
}

impl LocalCounterSource {
    pub fn new(total: u64) -> Self {
        Self {
            counters: Mutex::new(Counters { total, ..Counters::default() }),
        }
    }

    pub fn begin_item(&self, name: &str) {
        self.lock().current_item = Some(name.to_string());
    }

    pub fn record_success(&self) {
        let mut counters = self.lock();
        counters.processed += 1;
        counters.successful += 1;
        counters.current_item = None;
    }

    pub fn record_failure(&self) {
        let mut counters = self.lock();
        counters.processed += 1;
        counters.failed += 1;
        counters.current_item = None;
    }

    pub fn snapshot(&self) -> RunStatus {
        let counters = self.lock();
        let progress = Progress::new(counters.processed, counters.total);
        if counters.processed >= counters.total {
            RunStatus::Completed {
                progress,
                outcome: Outcome {
                    created: counters.successful,
                    errors: counters.failed,
                    total_processed: counters.total,
                },
            }
        } else {
            RunStatus::Running {
                progress,
                current_item: counters.current_item.clone(),
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StatusSource for LocalCounterSource {
    async fn fetch_status(&self) -> DiscoveryResult<RunStatus> {
        Ok(self.snapshot())
    }
}
