//! Core business logic modules
//!
//! Pure logic with no I/O: the stage machine, the result watermark and the
//! per-scope run guard.

pub mod reconciler;
pub mod registry;
pub mod transitions;

pub use reconciler::{Reconciliation, ResultReconciler};
pub use registry::{RunRegistry, ScopeClaim};
pub use transitions::{apply_status, merge_progress, Transition, GENERIC_FAILURE_MESSAGE};
