use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::config::environment::AppConfig;
use crate::db::Database;
use crate::infra::InfraClients;
use crate::module::print_job::route::register_routes;
use crate::service::file_id_service::ShortIdGenerator;
use crate::service::file_service::FileStore;
use crate::service::validation_service::MAX_UPLOAD_BYTES;

/// Transport-level body cap. Slightly above the upload limit so an
/// oversized model reaches validation and gets a structured error
/// instead of a bare 413.
const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES as usize + 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub files: Arc<FileStore>,
    pub short_ids: Arc<ShortIdGenerator>,
}

impl AppState {
    pub fn new(config: AppConfig, infra: InfraClients) -> Self {
        Self {
            config,
            db: infra.db,
            files: infra.files,
            short_ids: infra.short_ids,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    register_routes(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
