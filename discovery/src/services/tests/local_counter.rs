//! Tests for LocalCounterSource

use crate::services::local_counter::LocalCounterSource;
use crate::traits::StatusSource;
use crate::types::{Outcome, Progress, RunStatus};

#[tokio::test]
async fn test_reports_running_with_current_item() {
    let counter = LocalCounterSource::new(3);
    counter.begin_item("Cooling Post");

    let status = counter.fetch_status().await.unwrap();
    assert_eq!(
        status,
        RunStatus::Running {
            progress: Progress::new(0, 3),
            current_item: Some("Cooling Post".to_string()),
        }
    );
}

#[tokio::test]
async fn test_recording_clears_current_item() {
    let counter = LocalCounterSource::new(3);
    counter.begin_item("Cooling Post");
    counter.record_success();

    assert_eq!(counter.fetch_status().await.unwrap(), RunStatus::running(1, 3));
}

#[tokio::test]
async fn test_completes_when_every_item_resolved() {
    let counter = LocalCounterSource::new(3);
    counter.record_success();
    counter.record_failure();
    counter.record_success();

    let status = counter.fetch_status().await.unwrap();
    assert_eq!(
        status,
        RunStatus::Completed {
            progress: Progress::new(3, 3),
            outcome: Outcome { created: 2, errors: 1, total_processed: 3 },
        }
    );
}

#[tokio::test]
async fn test_all_failures_still_complete() {
    let counter = LocalCounterSource::new(2);
    counter.record_failure();
    counter.record_failure();

    match counter.fetch_status().await.unwrap() {
        RunStatus::Completed { outcome, .. } => {
            assert_eq!(outcome.created, 0);
            assert_eq!(outcome.errors, 2);
        }
        other => panic!("expected completed status, got {other:?}"),
    }
}
