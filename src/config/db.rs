use std::path::PathBuf;

use crate::config::environment::AppConfig;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl DatabaseConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            path: app.database_path.clone(),
        }
    }
}

impl StorageConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            root: app.storage_root.clone(),
        }
    }
}
