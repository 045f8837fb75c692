use super::controller;
use crate::app::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/submit", post(controller::submit_job))
        .route("/confirm/:token", get(controller::confirm_job))
        .route("/health", get(controller::health))
        .route("/dashboard/api/stats", get(controller::get_stats))
        .route("/dashboard/api/jobs/:job_id", get(controller::get_job))
        .route(
            "/dashboard/api/jobs/:job_id/approve",
            post(controller::approve_job),
        )
        .route(
            "/dashboard/api/jobs/:job_id/reject",
            post(controller::reject_job),
        )
        .route(
            "/dashboard/api/jobs/:job_id/mark-reviewed",
            post(controller::mark_reviewed),
        )
        .route(
            "/dashboard/api/jobs/:job_id/mark-unreviewed",
            post(controller::mark_unreviewed),
        )
        .route(
            "/dashboard/api/jobs/:job_id/status",
            post(controller::advance_status),
        )
        .with_state(state)
}
