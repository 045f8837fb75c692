use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle states. Serialized form follows the dashboard contract
/// (`UPLOADED`, `READYTOPRINT`, `PAIDPICKEDUP`, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Uploaded,
    Pending,
    ReadyToPrint,
    Printing,
    Completed,
    PaidPickedUp,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        Self::Uploaded,
        Self::Pending,
        Self::ReadyToPrint,
        Self::Printing,
        Self::Completed,
        Self::PaidPickedUp,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Pending => "PENDING",
            Self::ReadyToPrint => "READYTOPRINT",
            Self::Printing => "PRINTING",
            Self::Completed => "COMPLETED",
            Self::PaidPickedUp => "PAIDPICKEDUP",
            Self::Rejected => "REJECTED",
        }
    }

    /// Name of the status directory holding this state's files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded",
            Self::Pending => "Pending",
            Self::ReadyToPrint => "ReadyToPrint",
            Self::Printing => "Printing",
            Self::Completed => "Completed",
            Self::PaidPickedUp => "PaidPickedUp",
            Self::Rejected => "Rejected",
        }
    }

    /// Key used in the dashboard stats payload and the `?status=` query.
    pub fn stats_key(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Pending => "pending",
            Self::ReadyToPrint => "ready",
            Self::Printing => "printing",
            Self::Completed => "completed",
            Self::PaidPickedUp => "paidpickedup",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    pub fn from_stats_key(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.stats_key() == raw)
    }
}

/// Text fields of the multipart submission form, assembled by the
/// controller before validation.
#[derive(Debug, Clone, Default)]
pub struct SubmitJobForm {
    pub student_name: String,
    pub student_email: String,
    pub discipline: String,
    pub class_number: String,
    pub print_method: String,
    pub color: String,
    pub printer: String,
    pub minimum_charge_consent: String,
}

/// The uploaded model file as received.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub success: bool,
    pub job_id: String,
    pub display_name: String,
    pub status: Option<JobStatus>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Full job view for the staff dashboard. The confirmation token is
/// deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: String,
    pub student_name: String,
    pub student_email: String,
    pub discipline: String,
    pub class_number: String,
    pub original_filename: String,
    pub display_name: String,
    pub file_path: String,
    pub metadata_path: Option<String>,
    pub status: JobStatus,
    pub printer: String,
    pub color: String,
    pub material: Option<String>,
    pub weight_g: Option<f64>,
    pub time_hours: Option<f64>,
    pub cost_usd: Option<f64>,
    pub acknowledged_minimum_charge: bool,
    pub student_confirmed: bool,
    pub student_confirmed_at: Option<String>,
    pub reject_reasons: Vec<String>,
    pub staff_viewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_updated_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
    pub timestamp: String,
    pub event_type: String,
    pub details: Option<Value>,
    pub triggered_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobResponse {
    pub success: bool,
    pub job: Option<JobView>,
    pub events: Vec<EventView>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsQuery {
    pub status: Option<String>,
}

/// Per-status job counts keyed the way the dashboard tabs expect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub uploaded: u64,
    pub pending: u64,
    pub ready: u64,
    pub printing: u64,
    pub completed: u64,
    pub paidpickedup: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub counts: StatusCounts,
    pub jobs: Vec<JobView>,
    pub current_status: String,
    pub timestamp: String,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveJobRequest {
    pub weight_g: f64,
    pub time_hours: f64,
    pub material: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveJobResponse {
    pub success: bool,
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub cost_usd: Option<f64>,
    pub confirm_url: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectJobRequest {
    #[serde(default)]
    pub reasons: Vec<String>,
    pub custom_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectJobResponse {
    pub success: bool,
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub reject_reasons: Vec<String>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewToggleResponse {
    pub success: bool,
    pub job_id: String,
    pub idempotent: bool,
    pub staff_viewed_at: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceStatusRequest {
    pub next_status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceStatusResponse {
    pub success: bool,
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub idempotent: bool,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmJobResponse {
    pub success: bool,
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub confirmed_at: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub database_available: bool,
    pub storage_available: bool,
    pub error_code: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_dashboard_contract() {
        let json = serde_json::to_string(&JobStatus::ReadyToPrint).unwrap();
        assert_eq!(json, "\"READYTOPRINT\"");
        let json = serde_json::to_string(&JobStatus::PaidPickedUp).unwrap();
        assert_eq!(json, "\"PAIDPICKEDUP\"");
    }

    #[test]
    fn status_round_trips_through_storage_string() {
        for status in JobStatus::ALL {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn stats_keys_cover_all_statuses() {
        assert_eq!(JobStatus::from_stats_key("ready"), Some(JobStatus::ReadyToPrint));
        assert_eq!(JobStatus::from_stats_key("uploaded"), Some(JobStatus::Uploaded));
        assert_eq!(JobStatus::from_stats_key("READY"), None);
    }
}
