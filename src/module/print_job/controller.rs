use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info};

use super::crud;
use super::error::AppError;
use super::schema::{
    AdvanceStatusRequest, AdvanceStatusResponse, ApproveJobRequest, ApproveJobResponse,
    ConfirmJobResponse, GetJobResponse, HealthResponse, RejectJobRequest, RejectJobResponse,
    ReviewToggleResponse, StatsQuery, StatsResponse, StatusCounts, SubmitJobForm,
    SubmitJobResponse, UploadedFile,
};
use crate::app::AppState;
use crate::service::auth_service;

pub async fn submit_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let (form, upload) = match read_submission(multipart).await {
        Ok(parts) => parts,
        Err(err) => return error_submit(err),
    };

    match crud::submit_job(&state, form, upload).await {
        Ok(resp) => {
            info!(job_id = %resp.job_id, display_name = %resp.display_name, "print job submitted");
            (StatusCode::OK, Json(resp))
        }
        Err(err) => error_submit(err),
    }
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_stats(err);
    }

    match crud::get_stats(&state, query).await {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(err) => error_stats(err),
    }
}

pub async fn get_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_get(err);
    }

    match crud::get_job(&state, &job_id).await {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(err) => error_get(err),
    }
}

pub async fn approve_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(req): Json<ApproveJobRequest>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_approve(err);
    }

    match crud::approve_job(&state, &job_id, req).await {
        Ok(resp) => {
            info!(job_id = %job_id, cost_usd = ?resp.cost_usd, "print job approved");
            (StatusCode::OK, Json(resp))
        }
        Err(err) => error_approve(err),
    }
}

pub async fn reject_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(req): Json<RejectJobRequest>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_reject(err);
    }

    match crud::reject_job(&state, &job_id, req).await {
        Ok(resp) => {
            info!(job_id = %job_id, "print job rejected");
            (StatusCode::OK, Json(resp))
        }
        Err(err) => error_reject(err),
    }
}

pub async fn mark_reviewed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_review(err);
    }

    match crud::mark_reviewed(&state, &job_id).await {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(err) => error_review(err),
    }
}

pub async fn mark_unreviewed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_review(err);
    }

    match crud::mark_unreviewed(&state, &job_id).await {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(err) => error_review(err),
    }
}

pub async fn advance_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(req): Json<AdvanceStatusRequest>,
) -> impl IntoResponse {
    if let Err(err) = auth_service::require_staff(&headers, &state.config.staff_password) {
        return error_advance(err);
    }

    match crud::advance_status(&state, &job_id, req).await {
        Ok(resp) => {
            info!(job_id = %job_id, status = ?resp.status, "print job status advanced");
            (StatusCode::OK, Json(resp))
        }
        Err(err) => error_advance(err),
    }
}

pub async fn confirm_job(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match crud::confirm_job(&state, &token).await {
        Ok(resp) => {
            info!(job_id = %resp.job_id, "student confirmed print job");
            (StatusCode::OK, Json(resp))
        }
        Err(err) => error_confirm(err),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database_available = state.db.with_conn(|conn| {
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    });
    let database_available = database_available.is_ok();
    let storage_available = state.files.root().is_dir();
    let ok = database_available && storage_available;

    (
        StatusCode::OK,
        Json(HealthResponse {
            ok,
            database_available,
            storage_available,
            error_code: None,
            message: if ok {
                "healthy".to_string()
            } else {
                "database or storage unavailable".to_string()
            },
        }),
    )
}

/// Drains the multipart stream into the text form and the uploaded file.
/// Unknown fields are ignored; the file field must be named `file`.
async fn read_submission(
    mut multipart: Multipart,
) -> Result<(SubmitJobForm, UploadedFile), AppError> {
    let mut form = SubmitJobForm::default();
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::bad_request("INVALID_MULTIPART", format!("malformed multipart body: {e}"))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let original_filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                AppError::bad_request("INVALID_FILE", format!("file upload failed: {e}"))
            })?;
            upload = Some(UploadedFile {
                original_filename,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(|e| {
            AppError::bad_request("INVALID_MULTIPART", format!("malformed field {name}: {e}"))
        })?;
        match name.as_str() {
            "student_name" => form.student_name = value,
            "student_email" => form.student_email = value,
            "discipline" => form.discipline = value,
            "class_number" => form.class_number = value,
            "print_method" => form.print_method = value,
            "color" => form.color = value,
            "printer" => form.printer = value,
            "minimum_charge_consent" => form.minimum_charge_consent = value,
            _ => {}
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::bad_request("INVALID_FILE", "a model file is required"))?;
    Ok((form, upload))
}

fn error_submit(err: AppError) -> (StatusCode, Json<SubmitJobResponse>) {
    error!(error_code = err.code, reason = %err.message, "print job submission rejected");
    (
        err.status,
        Json(SubmitJobResponse {
            success: false,
            job_id: String::new(),
            display_name: String::new(),
            status: None,
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_stats(err: AppError) -> (StatusCode, Json<StatsResponse>) {
    error!(error_code = err.code, reason = %err.message, "stats lookup failed");
    (
        err.status,
        Json(StatsResponse {
            success: false,
            counts: StatusCounts::default(),
            jobs: Vec::new(),
            current_status: String::new(),
            timestamp: String::new(),
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_get(err: AppError) -> (StatusCode, Json<GetJobResponse>) {
    error!(error_code = err.code, reason = %err.message, "print job lookup failed");
    (
        err.status,
        Json(GetJobResponse {
            success: false,
            job: None,
            events: Vec::new(),
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_approve(err: AppError) -> (StatusCode, Json<ApproveJobResponse>) {
    error!(error_code = err.code, reason = %err.message, "print job approval rejected");
    (
        err.status,
        Json(ApproveJobResponse {
            success: false,
            job_id: String::new(),
            status: None,
            cost_usd: None,
            confirm_url: None,
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_reject(err: AppError) -> (StatusCode, Json<RejectJobResponse>) {
    error!(error_code = err.code, reason = %err.message, "print job rejection failed");
    (
        err.status,
        Json(RejectJobResponse {
            success: false,
            job_id: String::new(),
            status: None,
            reject_reasons: Vec::new(),
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_review(err: AppError) -> (StatusCode, Json<ReviewToggleResponse>) {
    error!(error_code = err.code, reason = %err.message, "review toggle failed");
    (
        err.status,
        Json(ReviewToggleResponse {
            success: false,
            job_id: String::new(),
            idempotent: false,
            staff_viewed_at: None,
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_advance(err: AppError) -> (StatusCode, Json<AdvanceStatusResponse>) {
    error!(error_code = err.code, reason = %err.message, "status advance rejected");
    (
        err.status,
        Json(AdvanceStatusResponse {
            success: false,
            job_id: String::new(),
            status: None,
            idempotent: false,
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}

fn error_confirm(err: AppError) -> (StatusCode, Json<ConfirmJobResponse>) {
    error!(error_code = err.code, reason = %err.message, "student confirmation rejected");
    (
        err.status,
        Json(ConfirmJobResponse {
            success: false,
            job_id: String::new(),
            status: None,
            confirmed_at: None,
            error_code: Some(err.code.to_string()),
            message: err.message,
        }),
    )
}
