//! Discovery run lifecycle
//!
//! `DiscoveryLifecycle` owns one run from confirmation to its final stage.
//! Starting a run spawns a background task that drives it:
//!
//! - **Polling**: the backend runs the job; the task fetches its status
//!   right away and then on every tick until a final status arrives, the
//!   polling ceiling elapses (the run becomes `Stalled`) or the caller
//!   cancels.
//! - **Sequential**: the client walks the eligible resources one request at
//!   a time and tracks the counters itself.
//!
//! Observers read the run through `snapshot()` or follow it with
//! `subscribe()`. Cancelling or dropping the lifecycle stops all further
//! network calls; results that arrive after that are discarded.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior};
use tracing::warn;
use uuid::Uuid;

use shared::{run_debug, run_error, run_info, run_warn};
use shared::{DiscoveryInfo, DiscoveryScope, DraftItem, LlmProvider, TargetItem};
use crate::config::LifecycleSettings;
use crate::core::{apply_status, Reconciliation, RunRegistry, ScopeClaim, Transition};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::services::remote_status::status_from_payload;
use crate::services::{CombinedStatusSource, DraftsFeed, LocalCounterSource, RemoteStatusSource};
use crate::state::{create_shared_state, SharedRunState};
use crate::traits::{DiscoveryApi, StatusSource};
use crate::types::{DiscoveryRun, Progress, RunStatus, Stage, StartConfig};

/// How a run makes progress
#[derive(Debug, Clone)]
enum DiscoveryMode {
    /// The backend runs the job and is polled for its status
    Polling,
    /// The client requests discovery item by item
    Sequential { targets: Vec<TargetItem> },
}

/// Run state plus everything that has to change together with it
struct RunCell {
    state: SharedRunState,
    updates: watch::Sender<DiscoveryRun>,
    claim: Mutex<Option<ScopeClaim>>,
}

impl RunCell {
    fn new(run: DiscoveryRun) -> Self {
        let (updates, _) = watch::channel(run.clone());
        Self {
            state: create_shared_state(run),
            updates,
            claim: Mutex::new(None),
        }
    }

    async fn snapshot(&self) -> DiscoveryRun {
        self.state.read().await.clone()
    }

    async fn run_id(&self) -> Uuid {
        self.state.read().await.id
    }

    async fn stage(&self) -> Stage {
        self.state.read().await.stage
    }

    fn publish(&self, run: DiscoveryRun) {
        self.updates.send_replace(run);
    }

    fn hold_claim(&self, claim: ScopeClaim) {
        *lock(&self.claim) = Some(claim);
    }

    fn release_claim(&self) {
        lock(&self.claim).take();
    }

    /// Apply a status, log the outcome and notify observers
    async fn apply(&self, status: RunStatus) -> Transition {
        let mut run = self.state.write().await;
        let transition = apply_status(&mut run, status);

        match transition {
            Transition::Rejected | Transition::Unchanged => return transition,
            Transition::Progressed => {
                run_debug!(
                    run.id,
                    processed = run.progress.processed,
                    total = run.progress.total,
                    "📊 Progress {}%",
                    run.percent()
                );
            }
            Transition::Completed => {
                let outcome = run.outcome.unwrap_or_default();
                run_info!(
                    run.id,
                    "✅ {} discovery finished: {} created, {} errors, {} processed",
                    run.scope,
                    outcome.created,
                    outcome.errors,
                    outcome.total_processed
                );
            }
            Transition::Failed => {
                run_error!(
                    run.id,
                    "❌ {} discovery failed: {}",
                    run.scope,
                    run.error_message.as_deref().unwrap_or_default()
                );
            }
        }

        let snapshot = run.clone();
        drop(run);

        if matches!(transition, Transition::Completed | Transition::Failed) {
            self.release_claim();
        }
        self.publish(snapshot);
        transition
    }

    /// Fetch one status and apply it unless the run was stopped meanwhile
    ///
    /// Fetch failures are logged and leave the run untouched.
    async fn poll(&self, source: &dyn StatusSource, stop: &watch::Receiver<bool>) -> Transition {
        let result = source.fetch_status().await;
        let run_id = self.run_id().await;

        match result {
            Ok(status) => {
                if stop_requested(stop) {
                    run_debug!(run_id, "Discarding status received after stop");
                    return Transition::Rejected;
                }
                self.apply(status).await
            }
            Err(e) if e.is_transient() => {
                run_warn!(run_id, "⚠️ Status fetch failed, retrying on next tick: {}", e);
                Transition::Unchanged
            }
            Err(e) => {
                run_error!(run_id, "⚠️ Unexpected status fetch error: {}", e);
                Transition::Unchanged
            }
        }
    }

    async fn mark_stalled(&self, ceiling: Duration) {
        let mut run = self.state.write().await;
        if run.stage != Stage::Running {
            return;
        }
        run.stage = Stage::Stalled;
        run_warn!(
            run.id,
            "⏱️ No final status after {:?}, stopped polling at {}%",
            ceiling,
            run.percent()
        );
        let snapshot = run.clone();
        drop(run);

        self.release_claim();
        self.publish(snapshot);
    }
}

/// Drives one discovery run for a scope
pub struct DiscoveryLifecycle<A: DiscoveryApi + 'static> {
    api: Arc<A>,
    scope: DiscoveryScope,
    mode: DiscoveryMode,
    settings: LifecycleSettings,
    registry: RunRegistry,
    status_source: Option<Arc<dyn StatusSource>>,
    cell: Arc<RunCell>,
    stop: Mutex<Option<watch::Sender<bool>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<A: DiscoveryApi + 'static> DiscoveryLifecycle<A> {
    /// Lifecycle for a backend job, followed by polling its status
    pub fn polling(api: Arc<A>, scope: DiscoveryScope, settings: LifecycleSettings) -> Self {
        Self::build(api, scope, DiscoveryMode::Polling, settings)
    }

    /// Lifecycle for a client-driven sweep over `targets`
    ///
    /// Only automatic and hybrid resources are requested.
    pub fn sequential(api: Arc<A>, targets: Vec<TargetItem>, settings: LifecycleSettings) -> Self {
        Self::build(
            api,
            DiscoveryScope::Resources,
            DiscoveryMode::Sequential { targets },
            settings,
        )
    }

    fn build(api: Arc<A>, scope: DiscoveryScope, mode: DiscoveryMode, settings: LifecycleSettings) -> Self {
        Self {
            api,
            scope,
            mode,
            settings,
            registry: RunRegistry::new(),
            status_source: None,
            cell: Arc::new(RunCell::new(DiscoveryRun::new(scope))),
            stop: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Share a registry so lifecycles of the same scope exclude each other
    pub fn with_registry(mut self, registry: RunRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Poll `source` instead of the scope's own status endpoint
    pub fn with_status_source(mut self, source: Arc<dyn StatusSource>) -> Self {
        self.status_source = Some(source);
        self
    }

    pub fn scope(&self) -> DiscoveryScope {
        self.scope
    }

    /// Targets a sequential run would request, in order
    pub fn eligible_targets(&self) -> Vec<TargetItem> {
        match &self.mode {
            DiscoveryMode::Polling => Vec::new(),
            DiscoveryMode::Sequential { targets } => {
                targets.iter().filter(|t| t.is_eligible()).cloned().collect()
            }
        }
    }

    pub async fn snapshot(&self) -> DiscoveryRun {
        self.cell.snapshot().await
    }

    /// Follow every change of the run
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryRun> {
        self.cell.updates.subscribe()
    }

    /// Summary shown before confirming a run
    ///
    /// Falls back to an empty history ending today when the backend cannot
    /// provide one.
    pub async fn load_info(&self) -> DiscoveryInfo {
        match self.api.get_discovery_info(self.scope).await {
            Ok(info) => info,
            Err(e) => {
                warn!(scope = %self.scope, error = %e, "Discovery info unavailable, using defaults");
                DiscoveryInfo::fallback(self.eligible_targets().len() as u64)
            }
        }
    }

    /// Start the run with `provider`
    ///
    /// Allowed only from `Confirm`. On failure the run stays in `Confirm`
    /// with the error message set and the error is returned.
    pub async fn start(&self, provider: LlmProvider, config: StartConfig) -> DiscoveryResult<()> {
        self.settings.validate()?;
        self.ensure_stage("start", Stage::Confirm).await?;

        let targets = match &self.mode {
            DiscoveryMode::Polling => {
                if self.scope.requires_search_config() && config.search_config_id.is_none() {
                    return Err(DiscoveryError::validation(
                        "Select a search configuration before starting resource discovery",
                    ));
                }
                None
            }
            DiscoveryMode::Sequential { .. } => {
                let eligible = self.eligible_targets();
                if eligible.is_empty() {
                    return Err(DiscoveryError::validation(
                        "No automatic or hybrid resources to search",
                    ));
                }
                Some(eligible)
            }
        };

        let claim = self.registry.try_claim(self.scope)?;
        let stop = self.arm_stop();
        let started_at = Utc::now();
        let run_id = self.cell.run_id().await;

        let Some(targets) = targets else {
            run_info!(run_id, "🚀 Starting {} discovery with provider {}", self.scope, provider);

            let initial = match self.api.start_discovery(self.scope, provider, &config).await {
                Ok(payload) => payload,
                Err(e) => {
                    run_error!(run_id, "❌ Could not start {} discovery: {}", self.scope, e);
                    self.record_start_failure(&e).await;
                    self.disarm_stop();
                    return Err(e);
                }
            };

            self.enter_running(provider, started_at, Progress::default(), claim).await;
            if let Ok(status) = status_from_payload(&initial) {
                if self.cell.apply(status).await.is_final() {
                    return Ok(());
                }
            }
            self.spawn(poll_until_settled(
                Arc::clone(&self.cell),
                self.polling_source(),
                self.settings,
                stop,
            ));
            return Ok(());
        };

        run_info!(
            run_id,
            "🚀 Starting sequential discovery over {} resources with provider {}",
            targets.len(),
            provider
        );
        let total = targets.len() as u64;
        self.enter_running(provider, started_at, Progress::new(0, total), claim).await;
        self.spawn(sweep_targets(
            Arc::clone(&self.cell),
            Arc::clone(&self.api),
            targets,
            provider,
            self.settings,
            stop,
        ));
        Ok(())
    }

    /// Follow a job started elsewhere without issuing a start request
    ///
    /// Final states the status endpoint still reports from earlier jobs are
    /// ignored. If no job is running the run completes on the first status
    /// with an empty outcome.
    pub async fn attach(&self) -> DiscoveryResult<()> {
        if let DiscoveryMode::Sequential { .. } = self.mode {
            return Err(DiscoveryError::validation(
                "A sequential run cannot follow a backend job",
            ));
        }
        self.settings.validate()?;
        self.ensure_stage("attach", Stage::Confirm).await?;

        let claim = self.registry.try_claim(self.scope)?;
        let stop = self.arm_stop();
        let provider = self.cell.state.read().await.provider;
        self.enter_running(provider, Utc::now(), Progress::default(), claim).await;

        // Only a job seen running counts; with nothing running the follow ends at once
        let source: Arc<dyn StatusSource> = match &self.status_source {
            Some(source) => Arc::clone(source),
            None => Arc::new(CombinedStatusSource::new(vec![self.polling_source()])),
        };

        let run_id = self.cell.run_id().await;
        run_info!(run_id, "🔗 Following running {} discovery", self.scope);
        self.spawn(poll_until_settled(Arc::clone(&self.cell), source, self.settings, stop));
        Ok(())
    }

    /// Fetch and apply one status the way the polling loop does
    ///
    /// Fetch failures are tolerated. Sequential runs track their own
    /// counters, so this does nothing for them.
    pub async fn poll(&self) -> Transition {
        if let DiscoveryMode::Sequential { .. } = self.mode {
            return Transition::Unchanged;
        }
        let Some(stop) = self.stop_receiver() else {
            return Transition::Rejected;
        };
        let source = self.polling_source();
        self.cell.poll(source.as_ref(), &stop).await
    }

    /// Fetch one status on demand, reporting fetch failures to the caller
    ///
    /// Works from `Running` and `Stalled`; the latter is how a stalled run
    /// learns that the backend finished after all.
    pub async fn refresh(&self) -> DiscoveryResult<DiscoveryRun> {
        let stage = self.cell.stage().await;
        if !stage.accepts_updates() {
            return Err(DiscoveryError::InvalidStage { operation: "refresh", stage });
        }
        if let DiscoveryMode::Polling = self.mode {
            let status = self.polling_source().fetch_status().await?;
            self.cell.apply(status).await;
        }
        Ok(self.cell.snapshot().await)
    }

    /// Stop polling or iterating; the run keeps its current stage
    pub fn cancel(&self) {
        let stop = lock(&self.stop).take();
        if let Some(stop) = stop {
            let _ = stop.send(true);
        }
        self.cell.release_claim();
    }

    /// Discard a finished run and return to `Confirm` with a fresh id
    pub async fn reset(&self) -> DiscoveryResult<()> {
        let stage = self.cell.stage().await;
        match stage {
            Stage::Confirm => return Ok(()),
            Stage::Running => return Err(DiscoveryError::InvalidStage { operation: "reset", stage }),
            Stage::Done | Stage::Failed | Stage::Stalled => {}
        }

        self.cancel();
        self.abort_task();

        let fresh = DiscoveryRun::new(self.scope);
        run_info!(fresh.id, "🔄 Ready for a new {} discovery run", self.scope);
        *self.cell.state.write().await = fresh.clone();
        self.cell.publish(fresh);
        Ok(())
    }

    /// Wait for the background task to finish and return the final run
    pub async fn wait(&self) -> DiscoveryResult<DiscoveryRun> {
        let task = lock(&self.task).take();
        if let Some(task) = task {
            task.await?;
        }
        Ok(self.cell.snapshot().await)
    }

    /// Drafts created since this run started
    pub async fn new_drafts(&self) -> DiscoveryResult<Reconciliation<DraftItem>> {
        let started_at: Option<DateTime<Utc>> = self.cell.state.read().await.started_at;
        DraftsFeed::new(Arc::clone(&self.api)).refresh(started_at).await
    }

    async fn ensure_stage(&self, operation: &'static str, expected: Stage) -> DiscoveryResult<()> {
        let stage = self.cell.stage().await;
        if stage != expected {
            return Err(DiscoveryError::InvalidStage { operation, stage });
        }
        Ok(())
    }

    async fn enter_running(
        &self,
        provider: LlmProvider,
        started_at: DateTime<Utc>,
        progress: Progress,
        claim: ScopeClaim,
    ) {
        let mut run = self.cell.state.write().await;
        run.stage = Stage::Running;
        run.provider = provider;
        run.started_at = Some(started_at);
        run.progress = progress;
        run.outcome = None;
        run.error_message = None;
        run.current_item = None;
        let snapshot = run.clone();
        drop(run);

        self.cell.hold_claim(claim);
        self.cell.publish(snapshot);
    }

    async fn record_start_failure(&self, error: &DiscoveryError) {
        let mut run = self.cell.state.write().await;
        run.error_message = Some(error.user_message());
        let snapshot = run.clone();
        drop(run);
        self.cell.publish(snapshot);
    }

    fn polling_source(&self) -> Arc<dyn StatusSource> {
        match &self.status_source {
            Some(source) => Arc::clone(source),
            None => Arc::new(RemoteStatusSource::new(Arc::clone(&self.api), self.scope)),
        }
    }

    fn arm_stop(&self) -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        *lock(&self.stop) = Some(tx);
        rx
    }

    fn disarm_stop(&self) {
        lock(&self.stop).take();
    }

    fn stop_receiver(&self) -> Option<watch::Receiver<bool>> {
        lock(&self.stop).as_ref().map(watch::Sender::subscribe)
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        *lock(&self.task) = Some(tokio::spawn(task));
    }

    fn abort_task(&self) {
        let task = lock(&self.task).take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Stops the run; a request already in flight finishes in the detached task
/// and its result is discarded
impl<A: DiscoveryApi + 'static> Drop for DiscoveryLifecycle<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A dropped sender counts as a stop request
fn stop_requested(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow() || stop.has_changed().is_err()
}

async fn poll_until_settled(
    cell: Arc<RunCell>,
    source: Arc<dyn StatusSource>,
    settings: LifecycleSettings,
    mut stop: watch::Receiver<bool>,
) {
    let deadline = settings.polling_ceiling.map(|ceiling| Instant::now() + ceiling);
    let ceiling = async move {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(ceiling);

    if stop_requested(&stop) || cell.poll(source.as_ref(), &stop).await.is_final() {
        return;
    }
    let run_id = cell.run_id().await;

    let mut ticker = interval_at(Instant::now() + settings.poll_interval, settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = stop.changed() => {
                run_debug!(run_id, "Polling stopped");
                return;
            }
            _ = &mut ceiling => {
                if let Some(limit) = settings.polling_ceiling {
                    cell.mark_stalled(limit).await;
                }
                return;
            }
            _ = ticker.tick() => {
                if cell.poll(source.as_ref(), &stop).await.is_final() {
                    return;
                }
            }
        }
    }
}

async fn sweep_targets<A: DiscoveryApi>(
    cell: Arc<RunCell>,
    api: Arc<A>,
    targets: Vec<TargetItem>,
    provider: LlmProvider,
    settings: LifecycleSettings,
    mut stop: watch::Receiver<bool>,
) {
    let run_id = cell.run_id().await;
    let count = targets.len();
    let counter = LocalCounterSource::new(count as u64);

    for (index, item) in targets.into_iter().enumerate() {
        if stop_requested(&stop) {
            run_debug!(run_id, "Sweep stopped before {}", item.name);
            return;
        }

        counter.begin_item(&item.name);
        cell.poll(&counter, &stop).await;
        run_debug!(run_id, "🔎 [{}/{}] Discovering news for {}", index + 1, count, item.name);

        let result = api.discover_for_single_item(item.id, provider).await;
        if stop_requested(&stop) {
            run_debug!(run_id, "Discarding result for {} received after stop", item.name);
            return;
        }

        match result {
            Ok(response) if response.is_accepted() => counter.record_success(),
            Ok(response) => {
                run_warn!(
                    run_id,
                    "⚠️ Discovery for {} reported an error: {}",
                    item.name,
                    response.message.as_deref().unwrap_or("no details")
                );
                counter.record_failure();
            }
            Err(e) => {
                run_warn!(run_id, "⚠️ Discovery for {} failed: {}", item.name, e);
                counter.record_failure();
            }
        }

        if cell.poll(&counter, &stop).await.is_final() {
            return;
        }

        if index + 1 < count {
            tokio::select! {
                _ = sleep(settings.item_delay) => {}
                _ = stop.changed() => {
                    run_debug!(run_id, "Sweep stopped between items");
                    return;
                }
            }
        }
    }
}
