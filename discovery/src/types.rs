//! Discovery run data types

use std::fmt;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{DiscoveryScope, LlmProvider};

/// Lifecycle phase of a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Waiting for the user to confirm the start
    Confirm,
    Running,
    Done,
    Failed,
    /// Polling ceiling elapsed without a terminal status
    Stalled,
}

impl Stage {
    /// Done and Failed close the run; only a reset leaves them
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Stages in which status updates are still applied
    pub fn accepts_updates(&self) -> bool {
        matches!(self, Stage::Running | Stage::Stalled)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Confirm => "confirm",
            Stage::Running => "running",
            Stage::Done => "done",
            Stage::Failed => "failed",
            Stage::Stalled => "stalled",
        };
        write!(f, "{name}")
    }
}

/// Processed/total counters of a running job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
}

impl Progress {
    /// Counters as reported; a zero `total` means none was reported
    ///
    /// Clamping happens when the counters are merged into a run.
    pub fn new(processed: u64, total: u64) -> Self {
        Self { processed, total }
    }

    /// Completion percentage rounded half away from zero, 0 when total is 0
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.processed.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }
}

/// Final counters of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outcome {
    pub created: u64,
    pub errors: u64,
    pub total_processed: u64,
}

/// Status as seen through a status source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// No job registered yet; nothing to apply
    Idle,
    Running {
        progress: Progress,
        current_item: Option<String>,
    },
    Completed {
        progress: Progress,
        outcome: Outcome,
    },
    Failed {
        reason: Option<String>,
    },
}

impl RunStatus {
    pub fn running(processed: u64, total: u64) -> Self {
        RunStatus::Running {
            progress: Progress::new(processed, total),
            current_item: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed { .. } | RunStatus::Failed { .. })
    }
}

/// Options the user picks before starting a run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartConfig {
    /// Search configuration to run resource discovery with
    pub search_config_id: Option<u64>,
    /// Restrict resource discovery to these sections, all when empty
    pub sections: Vec<String>,
    /// Override the start of the search period
    pub last_search_date: Option<NaiveDate>,
}

impl StartConfig {
    pub fn with_search_config(search_config_id: u64) -> Self {
        Self {
            search_config_id: Some(search_config_id),
            ..Self::default()
        }
    }
}

/// Client-side view of one discovery run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRun {
    pub id: Uuid,
    pub scope: DiscoveryScope,
    pub stage: Stage,
    pub provider: LlmProvider,
    pub started_at: Option<DateTime<Utc>>,
    pub progress: Progress,
    pub outcome: Option<Outcome>,
    pub error_message: Option<String>,
    /// Name of the item in flight, sequential runs only
    pub current_item: Option<String>,
}

impl DiscoveryRun {
    pub fn new(scope: DiscoveryScope) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            stage: Stage::Confirm,
            provider: LlmProvider::default(),
            started_at: None,
            progress: Progress::default(),
            outcome: None,
            error_message: None,
            current_item: None,
        }
    }

    pub fn percent(&self) -> u8 {
        self.progress.percent()
    }
}
