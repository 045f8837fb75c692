use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::module::print_job::error::AppError;

pub const STAFF_PASSWORD_HEADER: &str = "x-staff-password";

/// Requires a valid `x-staff-password` header. Missing header and wrong
/// password carry distinct error codes.
pub fn require_staff(headers: &HeaderMap, expected_password: &str) -> Result<(), AppError> {
    let presented = headers
        .get(STAFF_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::unauthorized("AUTH_REQUIRED", "x-staff-password header is required")
        })?;
    if !password_matches(presented, expected_password) {
        return Err(AppError::unauthorized(
            "AUTH_INVALID",
            "staff password is incorrect",
        ));
    }
    Ok(())
}

/// Fixed-width digest comparison instead of raw string equality.
fn password_matches(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
