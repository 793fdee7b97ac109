//! Service implementations
//!
//! Real implementations of the discovery traits: the HTTP client for the
//! dashboard backend and the status sources the lifecycle polls.

pub mod combined_status;
pub mod drafts_feed;
pub mod http_client;
pub mod local_counter;
pub mod remote_status;

#[cfg(test)]
pub mod tests;

pub use combined_status::CombinedStatusSource;
pub use drafts_feed::DraftsFeed;
pub use http_client::RealDiscoveryApi;
pub use local_counter::LocalCounterSource;
pub use remote_status::RemoteStatusSource;
