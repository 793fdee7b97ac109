//! Trait definitions with mockall annotations for testing
//!
//! These traits are the seams of the discovery core: the lifecycle talks to
//! the dashboard backend only through `DiscoveryApi` and learns about job
//! progress only through a `StatusSource`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shared::{
    DiscoveryInfo, DiscoveryScope, DiscoveryStatusPayload, DraftItem, LlmProvider,
    ProvidersResponse, SingleItemResponse, TargetItem,
};
use crate::error::DiscoveryResult;
use crate::types::{RunStatus, StartConfig};

/// Backend operations the discovery core consumes
///
/// All calls are plain request/response; none of them is retried here. The
/// lifecycle decides which failures are fatal and which are tolerated.
#[mockall::automock]
#[async_trait]
pub trait DiscoveryApi: Send + Sync {
    /// Summary of the previous run and the period the next one will cover
    async fn get_discovery_info(&self, scope: DiscoveryScope) -> DiscoveryResult<DiscoveryInfo>;

    /// Enqueue a backend discovery job and return its initial snapshot
    async fn start_discovery(
        &self,
        scope: DiscoveryScope,
        provider: LlmProvider,
        config: &StartConfig,
    ) -> DiscoveryResult<DiscoveryStatusPayload>;

    /// Current status of the backend job for `scope`
    async fn get_discovery_status(&self, scope: DiscoveryScope) -> DiscoveryResult<DiscoveryStatusPayload>;

    /// Request discovery for a single resource
    async fn discover_for_single_item(
        &self,
        item_id: u64,
        provider: LlmProvider,
    ) -> DiscoveryResult<SingleItemResponse>;

    /// Resources that a sequential sweep can iterate
    async fn list_resources(&self) -> DiscoveryResult<Vec<TargetItem>>;

    /// LLM providers the backend can use
    async fn list_providers(&self) -> DiscoveryResult<ProvidersResponse>;

    /// Draft news, newest first, optionally only those created at or after `created_after`
    async fn list_drafts(&self, created_after: Option<DateTime<Utc>>) -> DiscoveryResult<Vec<DraftItem>>;
}

/// Where progress numbers of a running job come from
#[mockall::automock]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status; transport failures are reported as errors
    async fn fetch_status(&self) -> DiscoveryResult<RunStatus>;
}
