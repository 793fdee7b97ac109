//! Status source backed by the backend's status endpoint

use std::sync::Arc;
use async_trait::async_trait;

use shared::{DiscoveryScope, DiscoveryStatusPayload, JobStatus};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::traits::{DiscoveryApi, StatusSource};
use crate::types::{Outcome, Progress, RunStatus};

/// Reads the status of the backend job for one scope
pub struct RemoteStatusSource<A: DiscoveryApi> {
    api: Arc<A>,
    scope: DiscoveryScope,
}

impl<A: DiscoveryApi> RemoteStatusSource<A> {
    pub fn new(api: Arc<A>, scope: DiscoveryScope) -> Self {
        Self { api, scope }
    }
}

/// Translate a wire status into a `RunStatus`
///
/// The backend's own `percent` is ignored; it is always derived from the
/// counters. A status value this client does not know is a decode error.
pub fn status_from_payload(payload: &DiscoveryStatusPayload) -> DiscoveryResult<RunStatus> {
    let progress = Progress::new(payload.processed, payload.total);
    match payload.status {
        JobStatus::Idle => Ok(RunStatus::Idle),
        JobStatus::Running => Ok(RunStatus::Running {
            progress,
            current_item: None,
        }),
        JobStatus::Completed => Ok(RunStatus::Completed {
            progress,
            outcome: Outcome {
                created: payload.created.unwrap_or(0),
                errors: payload.errors.unwrap_or(0),
                total_processed: payload.total_processed.unwrap_or(payload.processed),
            },
        }),
        JobStatus::Error => Ok(RunStatus::Failed {
            reason: payload.failure_message().map(str::to_string),
        }),
        JobStatus::Unknown => Err(DiscoveryError::Decode {
            message: "unrecognised job status in status response".to_string(),
        }),
    }
}

#[async_trait]
impl<A: DiscoveryApi> StatusSource for RemoteStatusSource<A> {
    async fn fetch_status(&self) -> DiscoveryResult<RunStatus> {
        let payload = self.api.get_discovery_status(self.scope).await?;
        status_from_payload(&payload)
    }
}
