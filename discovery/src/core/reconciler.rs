//! Matching backend items against the start of a run
//!
//! Items created at or after the run's `started_at` watermark are new. The
//! comparison uses the client clock captured just before the start request
//! went out, so an item the backend stamped slightly earlier than that can
//! be missed when the clocks drift.

use chrono::{DateTime, Utc};
use shared::Timestamped;

/// Items produced by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<T> {
    pub new_items: Vec<T>,
    pub new_count: usize,
}

impl<T> Default for Reconciliation<T> {
    fn default() -> Self {
        Self { new_items: Vec::new(), new_count: 0 }
    }
}

/// Stateless watermark filter
pub struct ResultReconciler;

impl ResultReconciler {
    /// Whether `item` was created at or after `started_at`
    ///
    /// Items without a creation time are never new.
    pub fn is_new<T: Timestamped>(item: &T, started_at: DateTime<Utc>) -> bool {
        item.created_at().is_some_and(|created| created >= started_at)
    }

    /// Keep the items created at or after `started_at`, preserving order
    ///
    /// Without a watermark nothing is new.
    pub fn reconcile<T>(items: &[T], started_at: Option<DateTime<Utc>>) -> Reconciliation<T>
    where
        T: Timestamped + Clone,
    {
        let Some(started_at) = started_at else {
            return Reconciliation::default();
        };

        let new_items: Vec<T> = items
            .iter()
            .filter(|item| Self::is_new(*item, started_at))
            .cloned()
            .collect();

        Reconciliation {
            new_count: new_items.len(),
            new_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::DraftItem;

    fn draft(id: u64, created_at: Option<DateTime<Utc>>) -> DraftItem {
        DraftItem {
            id,
            title: format!("Draft {id}"),
            status: Some("draft".to_string()),
            created_at,
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_keeps_items_at_or_after_watermark() {
        let started = at(10, 0);
        let items = vec![
            draft(1, Some(at(9, 59))),
            draft(2, Some(at(10, 0))),
            draft(3, Some(at(10, 5))),
            draft(4, None),
        ];

        let result = ResultReconciler::reconcile(&items, Some(started));
        let ids: Vec<u64> = result.new_items.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(result.new_count, 2);
    }

    #[test]
    fn test_no_watermark_means_nothing_is_new() {
        let items = vec![draft(1, Some(at(12, 0)))];
        let result = ResultReconciler::reconcile(&items, None);
        assert!(result.new_items.is_empty());
        assert_eq!(result.new_count, 0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let started = at(10, 0);
        let items = vec![draft(1, Some(at(11, 0))), draft(2, Some(at(8, 0)))];

        let first = ResultReconciler::reconcile(&items, Some(started));
        let second = ResultReconciler::reconcile(&items, Some(started));
        assert_eq!(first, second);

        let again = ResultReconciler::reconcile(&first.new_items, Some(started));
        assert_eq!(again, first);
    }
}
