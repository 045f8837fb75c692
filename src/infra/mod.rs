use std::sync::Arc;

use crate::config::db::{DatabaseConfig, StorageConfig};
use crate::config::environment::AppConfig;
use crate::db::Database;
use crate::service::file_id_service::ShortIdGenerator;
use crate::service::file_service::FileStore;

/// Filename of the short-id counter, kept next to the status directories.
pub const SHORT_ID_COUNTER_FILE: &str = "file_id_counter.txt";

#[derive(Clone)]
pub struct InfraClients {
    pub db: Database,
    pub files: Arc<FileStore>,
    pub short_ids: Arc<ShortIdGenerator>,
}

pub async fn init_infra(config: &AppConfig) -> Result<InfraClients, String> {
    let db_config = DatabaseConfig::from_app(config);
    let storage = StorageConfig::from_app(config);

    let db = Database::open(&db_config.path).map_err(|e| format!("database init failed: {e}"))?;

    let files = FileStore::new(&storage.root);
    files
        .ensure_layout()
        .map_err(|e| format!("storage init failed: {e}"))?;

    let short_ids = ShortIdGenerator::file_backed(storage.root.join(SHORT_ID_COUNTER_FILE));

    Ok(InfraClients {
        db,
        files: Arc::new(files),
        short_ids: Arc::new(short_ids),
    })
}
