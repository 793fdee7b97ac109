//! Items under review produced by discovery runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything the reconciler can place relative to a run's watermark
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// A draft news record as listed by the drafts endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Timestamped for DraftItem {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}
