//! News discovery client library
//!
//! Starts LLM-driven news discovery on the dashboard backend and follows the
//! resulting runs to completion. The backend is reached through the
//! `DiscoveryApi` trait and job progress through `StatusSource`, so the
//! lifecycle can be driven by mocks in tests.

pub mod config;
pub mod core;
pub mod error;
pub mod lifecycle;
pub mod services;
pub mod state;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, LifecycleSettings};
pub use crate::core::{Reconciliation, ResultReconciler, RunRegistry, Transition};
pub use error::{DiscoveryError, DiscoveryResult};
pub use lifecycle::DiscoveryLifecycle;
pub use traits::{DiscoveryApi, StatusSource};
pub use types::{DiscoveryRun, Outcome, Progress, RunStatus, Stage, StartConfig};
