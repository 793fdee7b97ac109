//! One active run per scope

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::DiscoveryScope;
use crate::error::{DiscoveryError, DiscoveryResult};

/// Tracks which scopes have a run in progress
///
/// Clones share the same set, so lifecycles built from one registry cannot
/// start two runs for the same scope.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    active: Arc<Mutex<HashSet<DiscoveryScope>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `scope` for a new run; the claim is released when dropped
    pub fn try_claim(&self, scope: DiscoveryScope) -> DiscoveryResult<ScopeClaim> {
        if !lock(&self.active).insert(scope) {
            return Err(DiscoveryError::AlreadyRunning { scope });
        }
        Ok(ScopeClaim {
            scope,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, scope: DiscoveryScope) -> bool {
        lock(&self.active).contains(&scope)
    }
}

/// Exclusive right to run discovery for one scope
#[derive(Debug)]
pub struct ScopeClaim {
    scope: DiscoveryScope,
    active: Arc<Mutex<HashSet<DiscoveryScope>>>,
}

impl ScopeClaim {
    pub fn scope(&self) -> DiscoveryScope {
        self.scope
    }
}

impl Drop for ScopeClaim {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.scope);
    }
}

fn lock(set: &Mutex<HashSet<DiscoveryScope>>) -> MutexGuard<'_, HashSet<DiscoveryScope>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}
