//! Test helpers and builder patterns for discovery tests
//!
//! `ApiBuilder` scripts a `MockDiscoveryApi`: status and per-item responses
//! are served in order and the last one repeats once the script runs out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::timeout;

use discovery::traits::{MockDiscoveryApi, MockStatusSource};
use discovery::{
    DiscoveryApi, DiscoveryError, DiscoveryLifecycle, DiscoveryRun, RunStatus, Stage, StatusSource,
};
use shared::{DiscoveryInfo, DiscoveryStatusPayload, SingleItemResponse};
use super::fixtures::TestFixtures;

/// One scripted backend answer
#[derive(Debug, Clone)]
pub enum Step {
    Status(DiscoveryStatusPayload),
    /// A failed request the polling loop should shrug off
    Transient,
}

impl Step {
    pub fn running(processed: u64, total: u64) -> Self {
        Step::Status(DiscoveryStatusPayload::running(processed, total))
    }

    pub fn completed(total: u64, created: u64, errors: u64) -> Self {
        Step::Status(DiscoveryStatusPayload::completed(total, created, errors))
    }

    pub fn error(message: Option<&str>) -> Self {
        Step::Status(DiscoveryStatusPayload::error(message))
    }

    fn resolve(&self) -> Result<DiscoveryStatusPayload, DiscoveryError> {
        match self {
            Step::Status(payload) => Ok(payload.clone()),
            Step::Transient => Err(DiscoveryError::Transport {
                status: Some(502),
                message: "Bad gateway".to_string(),
            }),
        }
    }
}

/// Builder for scripted backend mocks
pub struct ApiBuilder {
    api: MockDiscoveryApi,
    status_calls: Arc<AtomicUsize>,
    item_calls: Arc<Mutex<Vec<u64>>>,
}

impl ApiBuilder {
    pub fn new() -> Self {
        Self {
            api: MockDiscoveryApi::new(),
            status_calls: Arc::new(AtomicUsize::new(0)),
            item_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accept start requests with an initial snapshot
    pub fn with_start(mut self, initial: DiscoveryStatusPayload) -> Self {
        self.api
            .expect_start_discovery()
            .returning(move |_, _, _| Ok(initial.clone()));
        self
    }

    /// Refuse start requests the way the backend does
    pub fn with_rejected_start(mut self, status: u16, message: &'static str) -> Self {
        self.api.expect_start_discovery().returning(move |_, _, _| {
            Err(DiscoveryError::Transport {
                status: Some(status),
                message: message.to_string(),
            })
        });
        self
    }

    pub fn without_start(mut self) -> Self {
        self.api.expect_start_discovery().never();
        self
    }

    /// Serve status responses in order, repeating the last one
    pub fn with_status_script(mut self, steps: Vec<Step>) -> Self {
        let calls = Arc::clone(&self.status_calls);
        self.api.expect_get_discovery_status().returning(move |_| {
            let index = calls.fetch_add(1, Ordering::SeqCst);
            let step = steps.get(index).or_else(|| steps.last()).cloned().unwrap_or(Step::Transient);
            step.resolve()
        });
        self
    }

    pub fn without_status(mut self) -> Self {
        self.api.expect_get_discovery_status().never();
        self
    }

    /// Answer per-item requests in order; `false` marks a failed item
    pub fn with_item_script(mut self, outcomes: Vec<bool>) -> Self {
        let calls = Arc::clone(&self.item_calls);
        self.api.expect_discover_for_single_item().returning(move |id, _| {
            let mut seen = calls.lock().unwrap();
            let index = seen.len();
            seen.push(id);
            match outcomes.get(index).copied().unwrap_or(true) {
                true => Ok(SingleItemResponse {
                    status: "started".to_string(),
                    message: None,
                }),
                false => Err(DiscoveryError::Transport {
                    status: Some(500),
                    message: format!("discovery for resource {id} failed"),
                }),
            }
        });
        self
    }

    /// Hold every per-item request until `release` yields, then accept it
    ///
    /// `finished` counts the requests that returned.
    pub fn with_gated_items(mut self, release: mpsc::Receiver<()>, finished: Arc<AtomicUsize>) -> Self {
        let calls = Arc::clone(&self.item_calls);
        self.api.expect_discover_for_single_item().returning(move |id, _| {
            calls.lock().unwrap().push(id);
            let _ = release.recv_timeout(TestFixtures::SCENARIO_TIMEOUT);
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(SingleItemResponse {
                status: "started".to_string(),
                message: None,
            })
        });
        self
    }

    pub fn with_info(mut self, info: Result<DiscoveryInfo, &'static str>) -> Self {
        self.api.expect_get_discovery_info().returning(move |_| match &info {
            Ok(info) => Ok(info.clone()),
            Err(message) => Err(DiscoveryError::transport(*message)),
        });
        self
    }

    pub fn status_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.status_calls)
    }

    pub fn item_calls(&self) -> Arc<Mutex<Vec<u64>>> {
        Arc::clone(&self.item_calls)
    }

    pub fn build(self) -> Arc<MockDiscoveryApi> {
        Arc::new(self.api)
    }
}

/// Common assertions and waits
pub struct TestHelpers;

impl TestHelpers {
    /// Status source serving `statuses` in order, repeating the last one
    pub fn scripted_source(statuses: Vec<RunStatus>) -> Arc<dyn StatusSource> {
        let calls = AtomicUsize::new(0);
        let mut source = MockStatusSource::new();
        source.expect_fetch_status().returning(move || {
            let index = calls.fetch_add(1, Ordering::SeqCst);
            Ok(statuses.get(index).or_else(|| statuses.last()).cloned().unwrap_or(RunStatus::Idle))
        });
        Arc::new(source)
    }

    /// Wait for the background task and return the final run
    pub async fn finish<A: DiscoveryApi + 'static>(lifecycle: &DiscoveryLifecycle<A>) -> DiscoveryRun {
        timeout(TestFixtures::SCENARIO_TIMEOUT, lifecycle.wait())
            .await
            .expect("run did not settle in time")
            .expect("lifecycle task panicked")
    }

    /// Wait until the run reaches `stage`
    pub async fn wait_for_stage<A: DiscoveryApi + 'static>(
        lifecycle: &DiscoveryLifecycle<A>,
        stage: Stage,
    ) -> DiscoveryRun {
        let mut updates = lifecycle.subscribe();
        timeout(TestFixtures::SCENARIO_TIMEOUT, async move {
            updates
                .wait_for(|run| run.stage == stage)
                .await
                .map(|run| run.clone())
                .expect("lifecycle dropped while waiting")
        })
        .await
        .unwrap_or_else(|_| panic!("run never reached {stage}"))
    }

    /// Record every published snapshot until the run leaves `Running`
    pub fn record_snapshots<A: DiscoveryApi + 'static>(
        lifecycle: &DiscoveryLifecycle<A>,
    ) -> JoinHandle<Vec<DiscoveryRun>> {
        let mut updates = lifecycle.subscribe();
        tokio::spawn(async move {
            let mut seen = vec![updates.borrow_and_update().clone()];
            while updates.changed().await.is_ok() {
                let run = updates.borrow_and_update().clone();
                let settled = run.stage != Stage::Running && run.stage != Stage::Confirm;
                seen.push(run);
                if settled {
                    break;
                }
            }
            seen
        })
    }

    pub fn assert_monotonic(snapshots: &[DiscoveryRun]) {
        for pair in snapshots.windows(2) {
            assert!(
                pair[1].progress.processed >= pair[0].progress.processed,
                "processed went backwards: {:?} -> {:?}",
                pair[0].progress,
                pair[1].progress
            );
        }
        for run in snapshots {
            assert!(run.progress.processed <= run.progress.total || run.progress.total == 0);
            assert!(run.percent() <= 100);
        }
    }
}
