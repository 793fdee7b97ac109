//! Discovery job payloads

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Job state as reported by the status endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// No job has been registered for this scope
    #[serde(rename = "none")]
    Idle,
    Running,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

/// Snapshot returned by the start and status endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStatusPayload {
    pub status: JobStatus,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub errors: Option<u64>,
    #[serde(default)]
    pub total_processed: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl DiscoveryStatusPayload {
    pub fn running(processed: u64, total: u64) -> Self {
        Self {
            status: JobStatus::Running,
            processed,
            total,
            percent: None,
            created: None,
            errors: None,
            total_processed: None,
            message: None,
            error_message: None,
        }
    }

    pub fn completed(total: u64, created: u64, errors: u64) -> Self {
        Self {
            status: JobStatus::Completed,
            created: Some(created),
            errors: Some(errors),
            total_processed: Some(total),
            ..Self::running(total, total)
        }
    }

    pub fn error(message: Option<&str>) -> Self {
        Self {
            status: JobStatus::Error,
            message: message.map(str::to_string),
            ..Self::running(0, 0)
        }
    }

    /// Failure reason reported by the backend, if any
    pub fn failure_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error_message.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

/// Informational summary shown before a run is started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    #[serde(default)]
    pub last_discovery_date: Option<String>,
    #[serde(default)]
    pub period_start: Option<String>,
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default, alias = "total_resources", alias = "total_manufacturers")]
    pub total_targets: Option<u64>,
}

impl DiscoveryInfo {
    /// Summary used when the info endpoint is unreachable
    pub fn fallback(total_targets: u64) -> Self {
        Self {
            last_discovery_date: None,
            period_start: None,
            period_end: Some(Utc::now().date_naive().to_string()),
            total_targets: Some(total_targets),
        }
    }
}

/// Response to a single-item discovery request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleItemResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SingleItemResponse {
    /// The backend accepted the request unless it explicitly reported an error
    pub fn is_accepted(&self) -> bool {
        !self.status.eq_ignore_ascii_case("error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_running_status() {
        let payload: DiscoveryStatusPayload = serde_json::from_str(
            r#"{"status": "running", "processed": 5, "total": 20, "percent": 25}"#,
        )
        .unwrap();

        assert_eq!(payload.status, JobStatus::Running);
        assert_eq!(payload.processed, 5);
        assert_eq!(payload.total, 20);
        assert_eq!(payload.created, None);
    }

    #[test]
    fn test_parse_idle_and_unknown_status() {
        let idle: DiscoveryStatusPayload = serde_json::from_str(r#"{"status": "none"}"#).unwrap();
        assert_eq!(idle.status, JobStatus::Idle);
        assert_eq!(idle.total, 0);

        let odd: DiscoveryStatusPayload = serde_json::from_str(r#"{"status": "queued"}"#).unwrap();
        assert_eq!(odd.status, JobStatus::Unknown);
    }

    #[test]
    fn test_failure_message_prefers_message() {
        let payload: DiscoveryStatusPayload = serde_json::from_str(
            r#"{"status": "error", "message": "quota exceeded", "error_message": "other"}"#,
        )
        .unwrap();
        assert_eq!(payload.failure_message(), Some("quota exceeded"));

        let payload: DiscoveryStatusPayload =
            serde_json::from_str(r#"{"status": "error", "error_message": "boom"}"#).unwrap();
        assert_eq!(payload.failure_message(), Some("boom"));

        let payload: DiscoveryStatusPayload =
            serde_json::from_str(r#"{"status": "error", "message": "  "}"#).unwrap();
        assert_eq!(payload.failure_message(), None);
    }

    #[test]
    fn test_info_accepts_scope_specific_totals() {
        let info: DiscoveryInfo = serde_json::from_str(
            r#"{"last_discovery_date": null, "period_start": null, "period_end": "2025-01-31", "total_manufacturers": 12}"#,
        )
        .unwrap();
        assert_eq!(info.total_targets, Some(12));

        let info: DiscoveryInfo =
            serde_json::from_str(r#"{"period_end": "2025-01-31", "total_resources": 40}"#).unwrap();
        assert_eq!(info.total_targets, Some(40));
    }

    #[test]
    fn test_info_fallback() {
        let info = DiscoveryInfo::fallback(7);
        assert_eq!(info.total_targets, Some(7));
        assert!(info.last_discovery_date.is_none());
        assert!(info.period_end.is_some());
    }

    #[test]
    fn test_single_item_acceptance() {
        let ok: SingleItemResponse =
            serde_json::from_str(r#"{"status": "started", "message": "ok"}"#).unwrap();
        assert!(ok.is_accepted());

        let failed: SingleItemResponse =
            serde_json::from_str(r#"{"status": "error", "message": "no provider"}"#).unwrap();
        assert!(!failed.is_accepted());
    }
}
