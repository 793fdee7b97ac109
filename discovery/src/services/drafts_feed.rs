//! Drafts produced by a discovery run

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::debug;

use shared::DraftItem;
use crate::core::{Reconciliation, ResultReconciler};
use crate::error::DiscoveryResult;
use crate::traits::DiscoveryApi;

/// Loads drafts and keeps the ones created since a run started
pub struct DraftsFeed<A: DiscoveryApi> {
    api: Arc<A>,
}

impl<A: DiscoveryApi> DraftsFeed<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Fetch drafts newer than `started_at` and reconcile them against it
    ///
    /// The backend filter and the client-side watermark use the same
    /// instant; the second pass guards against backends that ignore the
    /// filter.
    pub async fn refresh(&self, started_at: Option<DateTime<Utc>>) -> DiscoveryResult<Reconciliation<DraftItem>> {
        let Some(since) = started_at else {
            return Ok(Reconciliation::default());
        };
        let drafts = self.api.list_drafts(Some(since)).await?;
        let result = ResultReconciler::reconcile(&drafts, Some(since));
        debug!(fetched = drafts.len(), new = result.new_count, "Reconciled drafts");
        Ok(result)
    }
}
