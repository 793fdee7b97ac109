//! Payloads exchanged with the dashboard backend
//!
//! This module organizes the backend payloads by category:
//! - `status`: discovery job start/status/info and per-item discovery
//! - `catalog`: read-only listings used before a run starts
//! - `drafts`: items under review created by discovery runs

pub mod status;
pub mod catalog;
pub mod drafts;

pub use status::{DiscoveryStatusPayload, JobStatus, DiscoveryInfo, SingleItemResponse};

pub use catalog::{ProviderDescriptor, ProvidersResponse};

pub use drafts::{DraftItem, Timestamped};
