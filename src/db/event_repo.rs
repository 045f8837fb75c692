//! Append-only audit trail for job lifecycle changes.
//!
//! Events are never updated or deleted. Callers that mutate a job row
//! append the matching event through the same transaction so the audit
//! trail cannot drift from job state.

use rusqlite::{params, Connection, Row};

use super::DatabaseError;

/// A raw event row from the database.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: i64,
    pub job_id: String,
    pub timestamp: String,
    pub event_type: String,
    pub details: Option<String>,
    pub triggered_by: String,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            timestamp: row.get("timestamp")?,
            event_type: row.get("event_type")?,
            details: row.get("details")?,
            triggered_by: row.get("triggered_by")?,
        })
    }
}

/// Appends one event for a job.
pub fn append(
    conn: &Connection,
    job_id: &str,
    event_type: &str,
    details: Option<&str>,
    triggered_by: &str,
    timestamp: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO events (job_id, timestamp, event_type, details, triggered_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![job_id, timestamp, event_type, details, triggered_by],
    )?;
    Ok(())
}

/// Lists all events for a job, newest first.
pub fn list_for_job(conn: &Connection, job_id: &str) -> Result<Vec<EventRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, job_id, timestamp, event_type, details, triggered_by
         FROM events WHERE job_id = ?1
         ORDER BY timestamp DESC, id DESC",
    )?;
    let rows = stmt
        .query_map(params![job_id], EventRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Counts events of one type for a job.
pub fn count_for_job_by_type(
    conn: &Connection,
    job_id: &str,
    event_type: &str,
) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE job_id = ?1 AND event_type = ?2",
        params![job_id, event_type],
        |r| r.get(0),
    )?;
    Ok(count)
}
