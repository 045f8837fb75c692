//! Row-level operations on the `jobs` table.
//!
//! Functions take a `&Connection` so they compose inside a transaction
//! (`&Transaction` derefs to `&Connection`). Lifecycle operations that
//! must pair a job mutation with an event append run both through the
//! same transaction in the crud layer.

use rusqlite::{params, Connection, Row};

use super::DatabaseError;

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub student_name: String,
    pub student_email: String,
    pub discipline: String,
    pub class_number: String,
    pub original_filename: String,
    pub display_name: String,
    pub file_path: String,
    pub metadata_path: Option<String>,
    pub status: String,
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
    pub reject_reasons: Option<String>,
    pub staff_viewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_updated_by: Option<String>,
    pub notes: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            student_name: row.get("student_name")?,
            student_email: row.get("student_email")?,
            discipline: row.get("discipline")?,
            class_number: row.get("class_number")?,
            original_filename: row.get("original_filename")?,
            display_name: row.get("display_name")?,
            file_path: row.get("file_path")?,
            metadata_path: row.get("metadata_path")?,
            status: row.get("status")?,
            printer: row.get("printer")?,
            color: row.get("color")?,
            material: row.get("material")?,
            weight_g: row.get("weight_g")?,
            time_hours: row.get("time_hours")?,
            cost_cents: row.get("cost_cents")?,
            acknowledged_minimum_charge: row.get("acknowledged_minimum_charge")?,
            student_confirmed: row.get("student_confirmed")?,
            student_confirmed_at: row.get("student_confirmed_at")?,
            confirm_token: row.get("confirm_token")?,
            confirm_token_expires: row.get("confirm_token_expires")?,
            reject_reasons: row.get("reject_reasons")?,
            staff_viewed_at: row.get("staff_viewed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            last_updated_by: row.get("last_updated_by")?,
            notes: row.get("notes")?,
        })
    }
}

/// Inserts a new job row.
pub fn insert(conn: &Connection, job: &JobRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO jobs (id, student_name, student_email, discipline, class_number,
         original_filename, display_name, file_path, metadata_path, status, printer, color,
         material, weight_g, time_hours, cost_cents, acknowledged_minimum_charge,
         student_confirmed, student_confirmed_at, confirm_token, confirm_token_expires,
         reject_reasons, staff_viewed_at, created_at, updated_at, last_updated_by, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
         ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
        params![
            job.id,
            job.student_name,
            job.student_email,
            job.discipline,
            job.class_number,
            job.original_filename,
            job.display_name,
            job.file_path,
            job.metadata_path,
            job.status,
            job.printer,
            job.color,
            job.material,
            job.weight_g,
            job.time_hours,
            job.cost_cents,
            job.acknowledged_minimum_charge,
            job.student_confirmed,
            job.student_confirmed_at,
            job.confirm_token,
            job.confirm_token_expires,
            job.reject_reasons,
            job.staff_viewed_at,
            job.created_at,
            job.updated_at,
            job.last_updated_by,
            job.notes,
        ],
    )?;
    Ok(())
}

/// Updates an existing job row. All fields except `id` and `created_at`
/// are overwritten.
pub fn update(conn: &Connection, job: &JobRow) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE jobs SET student_name=?2, student_email=?3, discipline=?4, class_number=?5,
         original_filename=?6, display_name=?7, file_path=?8, metadata_path=?9, status=?10,
         printer=?11, color=?12, material=?13, weight_g=?14, time_hours=?15, cost_cents=?16,
         acknowledged_minimum_charge=?17, student_confirmed=?18, student_confirmed_at=?19,
         confirm_token=?20, confirm_token_expires=?21, reject_reasons=?22, staff_viewed_at=?23,
         updated_at=?24, last_updated_by=?25, notes=?26
         WHERE id=?1",
        params![
            job.id,
            job.student_name,
            job.student_email,
            job.discipline,
            job.class_number,
            job.original_filename,
            job.display_name,
            job.file_path,
            job.metadata_path,
            job.status,
            job.printer,
            job.color,
            job.material,
            job.weight_g,
            job.time_hours,
            job.cost_cents,
            job.acknowledged_minimum_charge,
            job.student_confirmed,
            job.student_confirmed_at,
            job.confirm_token,
            job.confirm_token_expires,
            job.reject_reasons,
            job.staff_viewed_at,
            job.updated_at,
            job.last_updated_by,
            job.notes,
        ],
    )?;
    Ok(())
}

/// Finds a job by its ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
    match rows.next() {
        Some(Ok(row)) => Ok(Some(row)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Lists jobs with the given status, newest first.
pub fn list_by_status(conn: &Connection, status: &str) -> Result<Vec<JobRow>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT * FROM jobs WHERE status = ?1 ORDER BY created_at DESC")?;
    let rows = stmt
        .query_map(params![status], JobRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Counts jobs with the given status.
pub fn count_by_status(conn: &Connection, status: &str) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE status = ?1",
        params![status],
        |r| r.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory database")
    }

    fn sample_job(id: &str) -> JobRow {
        JobRow {
            id: id.to_string(),
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
    fn insert_and_find() {
        let db = test_db();
        db.with_conn(|conn| {
            insert(conn, &sample_job("job-1"))?;
            let found = find_by_id(conn, "job-1")?.expect("row");
            assert_eq!(found.student_name, "Jane Doe");
            assert_eq!(found.status, "UPLOADED");
            assert!(found.acknowledged_minimum_charge);
            assert!(!found.student_confirmed);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn find_nonexistent_is_none() {
        let db = test_db();
        db.with_conn(|conn| {
            assert!(find_by_id(conn, "nope")?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn update_overwrites_workflow_fields() {
        let db = test_db();
        db.with_conn(|conn| {
            let mut job = sample_job("job-2");
            insert(conn, &job)?;

            job.status = "PENDING".to_string();
            job.weight_g = Some(12.5);
            job.time_hours = Some(3.0);
            job.cost_cents = Some(300);
            job.file_path = "/storage/Pending/JaneDoe_Filament_Blue_a1.stl".to_string();
            update(conn, &job)?;

            let found = find_by_id(conn, "job-2")?.expect("row");
            assert_eq!(found.status, "PENDING");
            assert_eq!(found.weight_g, Some(12.5));
            assert_eq!(found.cost_cents, Some(300));
            assert!(found.file_path.contains("/Pending/"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn list_and_count_by_status() {
        let db = test_db();
        db.with_conn(|conn| {
            insert(conn, &sample_job("a"))?;
            insert(conn, &sample_job("b"))?;
            let mut rejected = sample_job("c");
            rejected.status = "REJECTED".to_string();
            insert(conn, &rejected)?;

            assert_eq!(count_by_status(conn, "UPLOADED")?, 2);
            assert_eq!(count_by_status(conn, "REJECTED")?, 1);
            assert_eq!(count_by_status(conn, "PRINTING")?, 0);
            assert_eq!(list_by_status(conn, "UPLOADED")?.len(), 2);
            Ok(())
        })
        .unwrap();
    }
}
