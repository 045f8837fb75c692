use crate::module::print_job::error::AppError;
use crate::module::print_job::schema::{ApproveJobRequest, RejectJobRequest, SubmitJobForm};

pub const ALLOWED_EXTENSIONS: &[&str] = &["stl", "obj", "3mf"];
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

pub fn validate_submission(form: &SubmitJobForm) -> Result<(), AppError> {
    if form.student_name.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_STUDENT_NAME",
            "student_name is required",
        ));
    }
    if !is_plausible_email(form.student_email.trim()) {
        return Err(AppError::bad_request(
            "INVALID_STUDENT_EMAIL",
            "student_email must be a valid email address",
        ));
    }
    if form.discipline.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_DISCIPLINE",
            "discipline is required",
        ));
    }
    if form.class_number.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_CLASS_NUMBER",
            "class_number is required",
        ));
    }
    if form.print_method.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_PRINT_METHOD",
            "print_method is required",
        ));
    }
    if form.color.trim().is_empty() {
        return Err(AppError::bad_request("INVALID_COLOR", "color is required"));
    }
    if form.printer.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_PRINTER",
            "printer is required",
        ));
    }
    if form.minimum_charge_consent.trim() != "yes" {
        return Err(AppError::bad_request(
            "CONSENT_REQUIRED",
            "minimum_charge_consent must be \"yes\"",
        ));
    }
    Ok(())
}

pub fn validate_upload(original_filename: &str, size_bytes: u64) -> Result<(), AppError> {
    if original_filename.trim().is_empty() {
        return Err(AppError::bad_request("INVALID_FILE", "a model file is required"));
    }
    let allowed = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false);
    if !allowed {
        return Err(AppError::bad_request(
            "FILE_TYPE_NOT_ALLOWED",
            "file must be one of: .stl, .obj, .3mf",
        ));
    }
    if size_bytes == 0 {
        return Err(AppError::bad_request("INVALID_FILE", "uploaded file is empty"));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(AppError::bad_request(
            "FILE_TOO_LARGE",
            "file exceeds the 100MB upload limit",
        ));
    }
    Ok(())
}

pub fn validate_approval(req: &ApproveJobRequest) -> Result<(), AppError> {
    if !req.weight_g.is_finite() || req.weight_g <= 0.0 {
        return Err(AppError::bad_request(
            "INVALID_WEIGHT",
            "weight_g must be a positive number",
        ));
    }
    if !req.time_hours.is_finite() || req.time_hours <= 0.0 {
        return Err(AppError::bad_request(
            "INVALID_TIME",
            "time_hours must be a positive number",
        ));
    }
    Ok(())
}

pub fn validate_rejection(req: &RejectJobRequest) -> Result<(), AppError> {
    let has_listed = req.reasons.iter().any(|r| !r.trim().is_empty());
    let has_custom = req
        .custom_reason
        .as_deref()
        .map(|r| !r.trim().is_empty())
        .unwrap_or(false);
    if !has_listed && !has_custom {
        return Err(AppError::bad_request(
            "INVALID_REJECT_REASONS",
            "at least one rejection reason or a custom_reason is required",
        ));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
