//! Shared types for the news discovery client
//!
//! Contains the vocabulary shared between the discovery core and its
//! consumers: wire payloads of the dashboard backend, provider and scope
//! identifiers, the shared error type and tracing setup.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

// Re-export the backend payloads consumed by the discovery core
pub use messages::{
    // Discovery job status and start
    DiscoveryStatusPayload, JobStatus, DiscoveryInfo, SingleItemResponse,

    // Catalog reads
    ProviderDescriptor, ProvidersResponse,

    // Items under review
    DraftItem, Timestamped,
};
