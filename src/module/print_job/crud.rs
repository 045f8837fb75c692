use std::path::Path;

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::error::AppError;
use super::model::{ACTOR_STAFF, ACTOR_STUDENT, EventType, JobRecord};
use super::schema::{
    AdvanceStatusRequest, AdvanceStatusResponse, ApproveJobRequest, ApproveJobResponse,
    ConfirmJobResponse, EventView, GetJobResponse, JobStatus, JobView, RejectJobRequest,
    RejectJobResponse, ReviewToggleResponse, StatsQuery, StatsResponse, StatusCounts,
    SubmitJobForm, SubmitJobResponse, UploadedFile,
};
use crate::app::AppState;
use crate::db::{event_repo, job_repo, DatabaseError};
use crate::service::cost_service;
use crate::service::file_id_service;
use crate::service::file_service::StorageError;
use crate::service::naming_service;
use crate::service::token_service::{self, TokenError};
use crate::service::validation_service;

pub async fn submit_job(
    state: &AppState,
    form: SubmitJobForm,
    upload: UploadedFile,
) -> Result<SubmitJobResponse, AppError> {
    validation_service::validate_submission(&form)?;
    validation_service::validate_upload(&upload.original_filename, upload.bytes.len() as u64)?;

    let short_id = state.short_ids.next_id();
    if short_id == file_id_service::FAILURE_SENTINEL {
        return Err(AppError::internal(
            "FILE_ID_FAILED",
            "could not allocate a file identifier",
        ));
    }

    let display_name = naming_service::standardized_name(
        &form.student_name,
        &form.print_method,
        &form.color,
        &short_id,
        &upload.original_filename,
    );
    let job_id = Uuid::new_v4().simple().to_string();
    let now = now_rfc3339();

    let primary = state
        .files
        .save_upload(JobStatus::Uploaded, &display_name, &upload.bytes)
        .map_err(|e| AppError::internal("FILE_SAVE_FAILED", e.to_string()))?;

    let metadata = json!({
        "job_id": job_id,
        "short_id": short_id,
        "student_name": form.student_name,
        "student_email": form.student_email,
        "discipline": form.discipline,
        "class_number": form.class_number,
        "print_method": form.print_method,
        "color": form.color,
        "printer": form.printer,
        "original_filename": upload.original_filename,
        "display_name": display_name,
        "submitted_at": now,
    });
    let metadata_path = state.files.write_metadata_sidecar(&primary, &metadata);

    let job = JobRecord {
        id: job_id,
        student_name: form.student_name.trim().to_string(),
        student_email: form.student_email.trim().to_string(),
        discipline: form.discipline.trim().to_string(),
        class_number: form.class_number.trim().to_string(),
        original_filename: upload.original_filename.clone(),
        display_name: display_name.clone(),
        file_path: primary.display().to_string(),
        metadata_path: metadata_path.map(|p| p.display().to_string()),
        status: JobStatus::Uploaded,
        printer: form.printer.trim().to_string(),
        color: form.color.trim().to_string(),
        material: None,
        weight_g: None,
        time_hours: None,
        cost_cents: None,
        acknowledged_minimum_charge: true,
        student_confirmed: false,
        student_confirmed_at: None,
        confirm_token: None,
        confirm_token_expires: None,
        reject_reasons: Vec::new(),
        staff_viewed_at: None,
        created_at: now.clone(),
        updated_at: now.clone(),
        last_updated_by: Some(ACTOR_STUDENT.to_string()),
        notes: None,
    };

    let row = job.to_row();
    let details = json!({
        "original_filename": upload.original_filename,
        "display_name": display_name,
        "printer": job.printer,
        "color": job.color,
    })
    .to_string();
    let inserted = state.db.with_conn(|conn| {
        let tx = conn.transaction()?;
        job_repo::insert(&tx, &row)?;
        event_repo::append(
            &tx,
            &row.id,
            EventType::JobCreated.as_str(),
            Some(&details),
            ACTOR_STUDENT,
            &now,
        )?;
        tx.commit()?;
        Ok(())
    });
    if let Err(e) = inserted {
        error!(
            job_id = %job.id,
            saved_path = %job.file_path,
            error = %e,
            "job insert failed after file save; file remains on disk"
        );
        return Err(AppError::internal(
            "DATABASE_ERROR",
            "failed to record the submitted job",
        ));
    }

    Ok(SubmitJobResponse {
        success: true,
        job_id: job.id,
        display_name,
        status: Some(JobStatus::Uploaded),
        error_code: None,
        message: "print job submitted".to_string(),
    })
}

pub async fn get_stats(state: &AppState, query: StatsQuery) -> Result<StatsResponse, AppError> {
    let tab = match query.status.as_deref() {
        None => JobStatus::Uploaded,
        Some(raw) => JobStatus::from_stats_key(raw).ok_or_else(|| {
            AppError::bad_request("INVALID_STATUS", format!("unknown status tab: {raw}"))
        })?,
    };

    let (counts, rows) = state.db.with_conn(|conn| {
        let mut counts = StatusCounts::default();
        for status in JobStatus::ALL {
            let n = job_repo::count_by_status(conn, status.as_str())?;
            match status {
                JobStatus::Uploaded => counts.uploaded = n,
                JobStatus::Pending => counts.pending = n,
                JobStatus::ReadyToPrint => counts.ready = n,
                JobStatus::Printing => counts.printing = n,
                JobStatus::Completed => counts.completed = n,
                JobStatus::PaidPickedUp => counts.paidpickedup = n,
                JobStatus::Rejected => counts.rejected = n,
            }
        }
        let rows = job_repo::list_by_status(conn, tab.as_str())?;
        Ok((counts, rows))
    })?;

    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        let record =
            JobRecord::from_row(row).map_err(|e| AppError::internal("DATABASE_ERROR", e))?;
        jobs.push(to_view(&record));
    }

    Ok(StatsResponse {
        success: true,
        counts,
        jobs,
        current_status: tab.stats_key().to_string(),
        timestamp: now_rfc3339(),
        error_code: None,
        message: "stats computed".to_string(),
    })
}

pub async fn get_job(state: &AppState, job_id: &str) -> Result<GetJobResponse, AppError> {
    let job = load_job(state, job_id)?;
    let event_rows = state
        .db
        .with_conn(|conn| event_repo::list_for_job(conn, job_id))?;
    let events = event_rows
        .into_iter()
        .map(|row| EventView {
            timestamp: row.timestamp,
            event_type: row.event_type,
            details: row.details.and_then(|d| serde_json::from_str(&d).ok()),
            triggered_by: row.triggered_by,
        })
        .collect();

    Ok(GetJobResponse {
        success: true,
        job: Some(to_view(&job)),
        events,
        error_code: None,
        message: "print job found".to_string(),
    })
}

pub async fn approve_job(
    state: &AppState,
    job_id: &str,
    req: ApproveJobRequest,
) -> Result<ApproveJobResponse, AppError> {
    validation_service::validate_approval(&req)?;

    let mut job = load_job(state, job_id)?;
    if job.status != JobStatus::Uploaded {
        return Err(wrong_status(JobStatus::Uploaded, job.status));
    }

    let cost_cents = cost_service::quote_cents(
        req.weight_g,
        req.material.as_deref(),
        &state.config.rate_card(),
    );

    let expires = Utc::now() + Duration::hours(state.config.confirm_token_ttl_hours);
    let token = token_service::sign(&job.id, expires.timestamp(), &state.config.secret_key)
        .map_err(|e| AppError::internal("TOKEN_SIGNING_FAILED", e.to_string()))?;

    // The hard-to-undo step comes first; the row is only committed once
    // the file sits in Pending/.
    let old_path = job.file_path.clone();
    let moved = state
        .files
        .move_to_status_dir(
            &job.id,
            Path::new(&job.file_path),
            job.metadata_path.as_deref().map(Path::new),
            JobStatus::Pending,
        )
        .map_err(move_error)?;

    let now = now_rfc3339();
    job.status = JobStatus::Pending;
    job.file_path = moved.primary.display().to_string();
    job.metadata_path = moved.sidecar.map(|p| p.display().to_string());
    job.material = req.material.clone();
    job.weight_g = Some(req.weight_g);
    job.time_hours = Some(req.time_hours);
    job.cost_cents = Some(cost_cents);
    job.confirm_token = Some(token.clone());
    job.confirm_token_expires = Some(expires.to_rfc3339_opts(SecondsFormat::Secs, true));
    job.staff_viewed_at = Some(now.clone());
    job.notes = req.notes.clone().or(job.notes);
    job.last_updated_by = Some(ACTOR_STAFF.to_string());
    job.updated_at = now.clone();

    let details = json!({
        "weight_g": req.weight_g,
        "time_hours": req.time_hours,
        "material": req.material,
        "cost_usd": cost_service::cents_to_usd(cost_cents),
        "staff_notes": req.notes,
    });
    if let Err(e) = commit_job_update(state, &job, EventType::StaffApproved, Some(details), ACTOR_STAFF, &now)
    {
        error!(
            job_id = %job.id,
            old_path = %old_path,
            new_path = %job.file_path,
            error = %e,
            "approve commit failed after file move; file stays in Pending for manual reconciliation"
        );
        return Err(AppError::internal(
            "DATABASE_ERROR",
            "failed to record approval after file move",
        ));
    }

    let confirm_url = format!(
        "{}/confirm/{}",
        state.config.base_url.trim_end_matches('/'),
        token
    );
    Ok(ApproveJobResponse {
        success: true,
        job_id: job.id,
        status: Some(JobStatus::Pending),
        cost_usd: Some(cost_service::cents_to_usd(cost_cents)),
        confirm_url: Some(confirm_url),
        error_code: None,
        message: "print job approved; awaiting student confirmation".to_string(),
    })
}

pub async fn reject_job(
    state: &AppState,
    job_id: &str,
    req: RejectJobRequest,
) -> Result<RejectJobResponse, AppError> {
    validation_service::validate_rejection(&req)?;

    let mut job = load_job(state, job_id)?;
    if job.status != JobStatus::Uploaded {
        return Err(wrong_status(JobStatus::Uploaded, job.status));
    }

    let mut reasons: Vec<String> = req
        .reasons
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(custom) = req.custom_reason.as_deref() {
        let custom = custom.trim();
        if !custom.is_empty() {
            reasons.push(custom.to_string());
        }
    }

    // Rejection keeps the file in Uploaded/; there is no Rejected move
    // for the model file, only the record flips.
    let now = now_rfc3339();
    job.status = JobStatus::Rejected;
    job.reject_reasons = reasons.clone();
    job.staff_viewed_at = Some(now.clone());
    job.notes = req.notes.clone().or(job.notes);
    job.last_updated_by = Some(ACTOR_STAFF.to_string());
    job.updated_at = now.clone();

    let details = json!({ "reasons": reasons, "staff_notes": req.notes });
    commit_job_update(state, &job, EventType::JobRejected, Some(details), ACTOR_STAFF, &now)?;

    Ok(RejectJobResponse {
        success: true,
        job_id: job.id,
        status: Some(JobStatus::Rejected),
        reject_reasons: reasons,
        error_code: None,
        message: "print job rejected".to_string(),
    })
}

pub async fn mark_reviewed(
    state: &AppState,
    job_id: &str,
) -> Result<ReviewToggleResponse, AppError> {
    let mut job = load_job(state, job_id)?;
    if job.staff_viewed_at.is_some() {
        return Ok(ReviewToggleResponse {
            success: true,
            job_id: job.id,
            idempotent: true,
            staff_viewed_at: job.staff_viewed_at,
            error_code: None,
            message: "job already marked reviewed".to_string(),
        });
    }

    let now = now_rfc3339();
    job.staff_viewed_at = Some(now.clone());
    job.last_updated_by = Some(ACTOR_STAFF.to_string());
    job.updated_at = now.clone();
    commit_job_update(state, &job, EventType::StaffReviewed, None, ACTOR_STAFF, &now)?;

    Ok(ReviewToggleResponse {
        success: true,
        job_id: job.id,
        idempotent: false,
        staff_viewed_at: Some(now),
        error_code: None,
        message: "job marked reviewed".to_string(),
    })
}

pub async fn mark_unreviewed(
    state: &AppState,
    job_id: &str,
) -> Result<ReviewToggleResponse, AppError> {
    let mut job = load_job(state, job_id)?;
    if job.staff_viewed_at.is_none() {
        return Ok(ReviewToggleResponse {
            success: true,
            job_id: job.id,
            idempotent: true,
            staff_viewed_at: None,
            error_code: None,
            message: "job already unreviewed".to_string(),
        });
    }

    let now = now_rfc3339();
    job.staff_viewed_at = None;
    job.last_updated_by = Some(ACTOR_STAFF.to_string());
    job.updated_at = now.clone();
    commit_job_update(state, &job, EventType::StaffUnreviewed, None, ACTOR_STAFF, &now)?;

    Ok(ReviewToggleResponse {
        success: true,
        job_id: job.id,
        idempotent: false,
        staff_viewed_at: None,
        error_code: None,
        message: "job marked unreviewed".to_string(),
    })
}

pub async fn advance_status(
    state: &AppState,
    job_id: &str,
    req: AdvanceStatusRequest,
) -> Result<AdvanceStatusResponse, AppError> {
    let mut job = load_job(state, job_id)?;

    if req.next_status == job.status {
        return Ok(AdvanceStatusResponse {
            success: true,
            job_id: job.id,
            status: Some(job.status),
            idempotent: true,
            error_code: None,
            message: "status update is idempotent".to_string(),
        });
    }
    if !is_valid_advance(job.status, req.next_status) {
        return Err(AppError::conflict(
            "INVALID_STATE_TRANSITION",
            format!(
                "cannot transition from {} to {}",
                job.status.as_str(),
                req.next_status.as_str()
            ),
        ));
    }

    let from = job.status;
    let old_path = job.file_path.clone();
    let moved = state
        .files
        .move_to_status_dir(
            &job.id,
            Path::new(&job.file_path),
            job.metadata_path.as_deref().map(Path::new),
            req.next_status,
        )
        .map_err(move_error)?;

    let now = now_rfc3339();
    job.status = req.next_status;
    job.file_path = moved.primary.display().to_string();
    job.metadata_path = moved.sidecar.map(|p| p.display().to_string());
    job.last_updated_by = Some(ACTOR_STAFF.to_string());
    job.updated_at = now.clone();

    let details = json!({ "from": from.as_str(), "to": req.next_status.as_str() });
    if let Err(e) = commit_job_update(state, &job, EventType::StatusAdvanced, Some(details), ACTOR_STAFF, &now)
    {
        error!(
            job_id = %job.id,
            old_path = %old_path,
            new_path = %job.file_path,
            error = %e,
            "status commit failed after file move; file stays in target directory for manual reconciliation"
        );
        return Err(AppError::internal(
            "DATABASE_ERROR",
            "failed to record transition after file move",
        ));
    }

    Ok(AdvanceStatusResponse {
        success: true,
        job_id: job.id,
        status: Some(req.next_status),
        idempotent: false,
        error_code: None,
        message: "status updated".to_string(),
    })
}

pub async fn confirm_job(state: &AppState, token: &str) -> Result<ConfirmJobResponse, AppError> {
    let verified = token_service::verify(token, &state.config.secret_key, Utc::now().timestamp())
        .map_err(|e| match e {
            TokenError::Expired => {
                AppError::bad_request("TOKEN_EXPIRED", "confirmation link has expired")
            }
            TokenError::Malformed | TokenError::BadSignature => {
                AppError::bad_request("TOKEN_INVALID", "confirmation link is not valid")
            }
            TokenError::SigningFailed => {
                AppError::internal("TOKEN_SIGNING_FAILED", "token verification unavailable")
            }
        })?;

    let mut job = load_job(state, &verified.job_id)?;
    if job.status != JobStatus::Pending {
        return Err(wrong_status(JobStatus::Pending, job.status));
    }
    if job.confirm_token.as_deref() != Some(token) {
        return Err(AppError::bad_request(
            "TOKEN_INVALID",
            "confirmation link is no longer active for this job",
        ));
    }

    let old_path = job.file_path.clone();
    let moved = state
        .files
        .move_to_status_dir(
            &job.id,
            Path::new(&job.file_path),
            job.metadata_path.as_deref().map(Path::new),
            JobStatus::ReadyToPrint,
        )
        .map_err(move_error)?;

    let now = now_rfc3339();
    job.status = JobStatus::ReadyToPrint;
    job.file_path = moved.primary.display().to_string();
    job.metadata_path = moved.sidecar.map(|p| p.display().to_string());
    job.student_confirmed = true;
    job.student_confirmed_at = Some(now.clone());
    job.confirm_token = None;
    job.confirm_token_expires = None;
    job.last_updated_by = Some(ACTOR_STUDENT.to_string());
    job.updated_at = now.clone();

    if let Err(e) = commit_job_update(state, &job, EventType::StudentConfirmed, None, ACTOR_STUDENT, &now)
    {
        error!(
            job_id = %job.id,
            old_path = %old_path,
            new_path = %job.file_path,
            error = %e,
            "confirm commit failed after file move; file stays in ReadyToPrint for manual reconciliation"
        );
        return Err(AppError::internal(
            "DATABASE_ERROR",
            "failed to record confirmation after file move",
        ));
    }

    Ok(ConfirmJobResponse {
        success: true,
        job_id: job.id,
        status: Some(JobStatus::ReadyToPrint),
        confirmed_at: Some(now),
        error_code: None,
        message: "print job confirmed; queued for printing".to_string(),
    })
}

fn load_job(state: &AppState, job_id: &str) -> Result<JobRecord, AppError> {
    let row = state
        .db
        .with_conn(|conn| job_repo::find_by_id(conn, job_id))?
        .ok_or_else(|| AppError::not_found("JOB_NOT_FOUND", "print job not found"))?;
    JobRecord::from_row(row).map_err(|e| AppError::internal("DATABASE_ERROR", e))
}

/// Writes the updated row and its audit event in one transaction so job
/// state and the event log cannot drift.
fn commit_job_update(
    state: &AppState,
    job: &JobRecord,
    event: EventType,
    details: Option<serde_json::Value>,
    actor: &str,
    timestamp: &str,
) -> Result<(), DatabaseError> {
    let row = job.to_row();
    let details = details.map(|d| d.to_string());
    state.db.with_conn(|conn| {
        let tx = conn.transaction()?;
        job_repo::update(&tx, &row)?;
        event_repo::append(
            &tx,
            &row.id,
            event.as_str(),
            details.as_deref(),
            actor,
            timestamp,
        )?;
        tx.commit()?;
        Ok(())
    })
}

fn wrong_status(required: JobStatus, actual: JobStatus) -> AppError {
    AppError::conflict(
        "WRONG_STATUS",
        format!(
            "job must be {} for this operation; current status is {}",
            required.as_str(),
            actual.as_str()
        ),
    )
}

fn move_error(e: StorageError) -> AppError {
    match e {
        StorageError::NotFound { .. } => AppError::not_found(
            "SOURCE_FILE_MISSING",
            "model file is missing from its status directory",
        ),
        other => AppError::internal("FILE_MOVE_FAILED", other.to_string()),
    }
}

fn is_valid_advance(from: JobStatus, to: JobStatus) -> bool {
    matches!(
        (from, to),
        (JobStatus::ReadyToPrint, JobStatus::Printing)
            | (JobStatus::Printing, JobStatus::Completed)
            | (JobStatus::Completed, JobStatus::PaidPickedUp)
    )
}

fn to_view(job: &JobRecord) -> JobView {
    JobView {
        job_id: job.id.clone(),
        student_name: job.student_name.clone(),
        student_email: job.student_email.clone(),
        discipline: job.discipline.clone(),
        class_number: job.class_number.clone(),
        original_filename: job.original_filename.clone(),
        display_name: job.display_name.clone(),
        file_path: job.file_path.clone(),
        metadata_path: job.metadata_path.clone(),
        status: job.status,
        printer: job.printer.clone(),
        color: job.color.clone(),
        material: job.material.clone(),
        weight_g: job.weight_g,
        time_hours: job.time_hours,
        cost_usd: job.cost_cents.map(cost_service::cents_to_usd),
        acknowledged_minimum_charge: job.acknowledged_minimum_charge,
        student_confirmed: job.student_confirmed,
        student_confirmed_at: job.student_confirmed_at.clone(),
        reject_reasons: job.reject_reasons.clone(),
        staff_viewed_at: job.staff_viewed_at.clone(),
        created_at: job.created_at.clone(),
        updated_at: job.updated_at.clone(),
        last_updated_by: job.last_updated_by.clone(),
        notes: job.notes.clone(),
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
