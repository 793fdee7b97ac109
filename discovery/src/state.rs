//! Discovery run state management

use std::sync::Arc;
use tokio::sync::RwLock;
use crate::types::DiscoveryRun;

/// Shared run state wrapper
pub type SharedRunState = Arc<RwLock<DiscoveryRun>>;

/// Create new shared run state
pub fn create_shared_state(run: DiscoveryRun) -> SharedRunState {
    Arc::new(RwLock::new(run))
}
