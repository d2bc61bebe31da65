use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentwatch_core::RentalId;
use rentwatch_infra::reminders::{Notified, ScanReport};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerTaskRequest {
    pub task_name: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub name: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TriggerTaskResponse {
    pub message: String,
    pub report: ScanReportDto,
}

/// A rental the scan could not handle.
#[derive(Debug, Serialize)]
pub struct RentalIssue {
    pub rental_id: RentalId,
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ScanReportDto {
    pub scan_id: String,
    pub started_at: DateTime<Utc>,
    pub evaluated: usize,
    pub notified: usize,
    pub notifications: Vec<Notified>,
    pub skipped: Vec<RentalIssue>,
    pub failed: Vec<RentalIssue>,
}

impl From<&ScanReport> for ScanReportDto {
    fn from(report: &ScanReport) -> Self {
        Self {
            scan_id: report.scan_id.to_string(),
            started_at: report.started_at,
            evaluated: report.evaluated,
            notified: report.notified,
            notifications: report.notifications.clone(),
            skipped: report
                .skipped
                .iter()
                .map(|(id, err)| RentalIssue {
                    rental_id: *id,
                    error: err.code(),
                    message: err.to_string(),
                })
                .collect(),
            failed: report
                .failed
                .iter()
                .map(|(id, err)| RentalIssue {
                    rental_id: *id,
                    error: "send_failed",
                    message: err.to_string(),
                })
                .collect(),
        }
    }
}
