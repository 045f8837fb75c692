use std::path::PathBuf;

use http::Request;
use print_job_tracker::app::{build_router, AppState};
use print_job_tracker::config::environment::AppConfig;
use print_job_tracker::infra::init_infra;
use print_job_tracker::module::print_job::schema::{
    GetJobResponse, StatsResponse, SubmitJobResponse,
};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const MULTIPART_BOUNDARY: &str = "----print-job-test-boundary";

pub struct TestContext {
    pub app: axum::Router,
    pub storage_root: PathBuf,
    pub staff_password: String,
    #[allow(dead_code)]
    pub secret_key: String,
    _root: TempDir,
}

pub async fn build_test_context() -> TestContext {
    let root = TempDir::new().expect("create temp dir");
    let storage_root = root.path().join("storage");
    let config = AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        secret_key: "integration-test-secret".to_string(),
        staff_password: "staff-test-password".to_string(),
        database_path: root.path().join("data").join("print_jobs.db"),
        storage_root: storage_root.clone(),
        base_url: "http://localhost:8080".to_string(),
        confirm_token_ttl_hours: 168,
        filament_cents_per_g: 10,
        resin_cents_per_g: 20,
        minimum_charge_cents: 300,
    };

    let infra = init_infra(&config)
        .await
        .expect("failed to initialize database and storage for integration tests");
    let app = build_router(AppState::new(config.clone(), infra));

    TestContext {
        app,
        storage_root,
        staff_password: config.staff_password,
        secret_key: config.secret_key,
        _root: root,
    }
}

/// Standard submission form; tests override individual fields.
pub fn valid_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("student_name", "John O'Brien"),
        ("student_email", "jobrien@campus.edu"),
        ("discipline", "Architecture"),
        ("class_number", "ARCH-301"),
        ("print_method", "Filament"),
        ("color", "True Red"),
        ("printer", "Prusa MK4"),
        ("minimum_charge_consent", "yes"),
    ]
}

pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    (
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        body,
    )
}

pub async fn post_submission(
    app: &mut axum::Router,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> (http::StatusCode, SubmitJobResponse) {
    let (content_type, body) = multipart_body(fields, file);
    let request = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", content_type)
        .body(axum::body::Body::from(body))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: SubmitJobResponse = serde_json::from_slice(&body).expect("deserialize response");
    (status, payload)
}

/// Submits the standard form with a small STL payload and asserts success.
pub async fn submit_valid_job(ctx: &mut TestContext) -> SubmitJobResponse {
    let fields = valid_fields();
    let (status, body) =
        post_submission(&mut ctx.app, &fields, Some(("part.stl", b"solid part"))).await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(body.success);
    body
}

pub async fn staff_get_stats(
    app: &mut axum::Router,
    password: &str,
    status_tab: Option<&str>,
) -> (http::StatusCode, StatsResponse) {
    let uri = match status_tab {
        Some(tab) => format!("/dashboard/api/stats?status={tab}"),
        None => "/dashboard/api/stats".to_string(),
    };
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-staff-password", password)
        .body(axum::body::Body::empty())
        .expect("build request");

    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: StatsResponse = serde_json::from_slice(&body).expect("deserialize response");
    (status, payload)
}

pub async fn staff_get_job(
    app: &mut axum::Router,
    password: &str,
    job_id: &str,
) -> (http::StatusCode, GetJobResponse) {
    let request = Request::builder()
        .method("GET")
        .uri(format!("/dashboard/api/jobs/{job_id}"))
        .header("x-staff-password", password)
        .body(axum::body::Body::empty())
        .expect("build request");

    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: GetJobResponse = serde_json::from_slice(&body).expect("deserialize response");
    (status, payload)
}
