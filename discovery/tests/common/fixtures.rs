//! Test fixtures and data for discovery tests

use std::time::Duration;

use discovery::LifecycleSettings;
use shared::{SourceType, TargetItem};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SEARCH_CONFIG_ID: u64 = 4;
    pub const BACKEND_FAILURE: &'static str = "Provider quota exceeded";

    /// Upper bound for any single test scenario
    pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(5);

    /// Millisecond timings so scenarios finish quickly
    pub fn fast_settings() -> LifecycleSettings {
        LifecycleSettings {
            poll_interval: Duration::from_millis(10),
            polling_ceiling: Some(Duration::from_secs(3)),
            item_delay: Duration::from_millis(5),
        }
    }

    /// Settings whose ceiling elapses after a handful of polls
    pub fn short_ceiling_settings() -> LifecycleSettings {
        LifecycleSettings {
            polling_ceiling: Some(Duration::from_millis(80)),
            ..Self::fast_settings()
        }
    }

    /// Resources with a manual one mixed in; ids 1, 2 and 4 are eligible
    pub fn resources() -> Vec<TargetItem> {
        vec![
            TargetItem::new(1, "Cooling Post", SourceType::Auto),
            TargetItem::new(2, "HVAC Weekly", SourceType::Hybrid),
            TargetItem::new(3, "Print Archive", SourceType::Manual),
            TargetItem::new(4, "Refrigeration World", SourceType::Auto),
        ]
    }

    pub fn manual_only_resources() -> Vec<TargetItem> {
        vec![
            TargetItem::new(3, "Print Archive", SourceType::Manual),
            TargetItem {
                id: 5,
                name: "Unclassified".to_string(),
                source_type: None,
            },
        ]
    }
}
