use super::schema::JobStatus;
use crate::db::job_repo::JobRow;

/// Audit event vocabulary. Stored as TEXT in the events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    JobCreated,
    StaffApproved,
    JobRejected,
    StaffReviewed,
    StaffUnreviewed,
    StatusAdvanced,
    StudentConfirmed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobCreated => "JobCreated",
            Self::StaffApproved => "StaffApproved",
            Self::JobRejected => "JobRejected",
            Self::StaffReviewed => "StaffReviewed",
            Self::StaffUnreviewed => "StaffUnreviewed",
            Self::StatusAdvanced => "StatusAdvanced",
            Self::StudentConfirmed => "StudentConfirmed",
        }
    }
}

/// Actor tags recorded on events and `last_updated_by`.
pub const ACTOR_STUDENT: &str = "student";
pub const ACTOR_STAFF: &str = "staff";

/// A job with its status and rejection reasons in typed form. The crud
/// layer works on this; the repo layer stores the stringly `JobRow`.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: String,
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
    pub cost_cents: Option<i64>,
    pub acknowledged_minimum_charge: bool,
    pub student_confirmed: bool,
    pub student_confirmed_at: Option<String>,
    pub confirm_token: Option<String>,
    pub confirm_token_expires: Option<String>,
    pub reject_reasons: Vec<String>,
    pub staff_viewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_updated_by: Option<String>,
    pub notes: Option<String>,
}

impl JobRecord {
    /// Lifts a raw row into the typed record. Fails only on a status
    /// string the current code does not know, which indicates a corrupt
    /// or future-version database.
    pub fn from_row(row: JobRow) -> Result<Self, String> {
        let status = JobStatus::parse(&row.status)
            .ok_or_else(|| format!("unknown job status in database: {}", row.status))?;
        let reject_reasons = match &row.reject_reasons {
            Some(raw) => serde_json::from_str::<Vec<String>>(raw)
                .map_err(|e| format!("malformed reject_reasons for job {}: {e}", row.id))?,
            None => Vec::new(),
        };
        Ok(Self {
            id: row.id,
            student_name: row.student_name,
            student_email: row.student_email,
            discipline: row.discipline,
            class_number: row.class_number,
            original_filename: row.original_filename,
            display_name: row.display_name,
            file_path: row.file_path,
            metadata_path: row.metadata_path,
            status,
            printer: row.printer,
            color: row.color,
            material: row.material,
            weight_g: row.weight_g,
            time_hours: row.time_hours,
            cost_cents: row.cost_cents,
            acknowledged_minimum_charge: row.acknowledged_minimum_charge,
            student_confirmed: row.student_confirmed,
            student_confirmed_at: row.student_confirmed_at,
            confirm_token: row.confirm_token,
            confirm_token_expires: row.confirm_token_expires,
            reject_reasons,
            staff_viewed_at: row.staff_viewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_updated_by: row.last_updated_by,
            notes: row.notes,
        })
    }

    pub fn to_row(&self) -> JobRow {
        JobRow {
            id: self.id.clone(),
            student_name: self.student_name.clone(),
            student_email: self.student_email.clone(),
            discipline: self.discipline.clone(),
            class_number: self.class_number.clone(),
            original_filename: self.original_filename.clone(),
            display_name: self.display_name.clone(),
            file_path: self.file_path.clone(),
            metadata_path: self.metadata_path.clone(),
            status: self.status.as_str().to_string(),
            printer: self.printer.clone(),
            color: self.color.clone(),
            material: self.material.clone(),
            weight_g: self.weight_g,
            time_hours: self.time_hours,
            cost_cents: self.cost_cents,
            acknowledged_minimum_charge: self.acknowledged_minimum_charge,
            student_confirmed: self.student_confirmed,
            student_confirmed_at: self.student_confirmed_at.clone(),
            confirm_token: self.confirm_token.clone(),
            confirm_token_expires: self.confirm_token_expires.clone(),
            reject_reasons: if self.reject_reasons.is_empty() {
                None
            } else {
                serde_json::to_string(&self.reject_reasons).ok()
            },
            staff_viewed_at: self.staff_viewed_at.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            last_updated_by: self.last_updated_by.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> JobRow {
        JobRow {
            id: "4f3c2a".to_string(),
            student_name: "Jane Doe".to_string(),
            student_email: "jane@campus.edu".to_string(),
            discipline: "architecture".to_string(),
            class_number: "ARCH-301".to_string(),
            original_filename: "tower.stl".to_string(),
            display_name: "JaneDoe_Filament_Blue_a1.stl".to_string(),
            file_path: "/storage/Uploaded/JaneDoe_Filament_Blue_a1.stl".to_string(),
            metadata_path: None,
            status: "UPLOADED".to_string(),
            printer: "prusa_mk4s".to_string(),
            color: "blue".to_string(),
            material: None,
            weight_g: None,
            time_hours: None,
            cost_cents: None,
            acknowledged_minimum_charge: true,
            student_confirmed: false,
            student_confirmed_at: None,
            confirm_token: None,
            confirm_token_expires: None,
            reject_reasons: None,
            staff_viewed_at: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            last_updated_by: None,
            notes: None,
        }
    }

    #[test]
    fn row_round_trips_through_record() {
        let record = JobRecord::from_row(sample_row()).unwrap();
        assert_eq!(record.status, JobStatus::Uploaded);
        assert!(record.reject_reasons.is_empty());

        let row = record.to_row();
        assert_eq!(row.status, "UPLOADED");
        assert_eq!(row.reject_reasons, None);
    }

    #[test]
    fn reject_reasons_round_trip_as_json() {
        let mut row = sample_row();
        row.status = "REJECTED".to_string();
        row.reject_reasons = Some(r#"["walls too thin","unprintable overhang"]"#.to_string());

        let record = JobRecord::from_row(row).unwrap();
        assert_eq!(record.reject_reasons.len(), 2);

        let back = record.to_row();
        let parsed: Vec<String> = serde_json::from_str(back.reject_reasons.as_deref().unwrap()).unwrap();
        assert_eq!(parsed[0], "walls too thin");
    }

    #[test]
    fn unknown_status_is_an_error() {
        let mut row = sample_row();
        row.status = "SHIPPED".to_string();
        assert!(JobRecord::from_row(row).is_err());
    }
}
