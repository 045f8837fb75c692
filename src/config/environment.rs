use std::env;
use std::path::PathBuf;

use crate::db::default_database_path;
use crate::service::cost_service::RateCard;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub secret_key: String,
    pub staff_password: String,
    pub database_path: PathBuf,
    pub storage_root: PathBuf,
    pub base_url: String,
    pub confirm_token_ttl_hours: i64,
    pub filament_cents_per_g: i64,
    pub resin_cents_per_g: i64,
    pub minimum_charge_cents: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        load_dotenv_layers();
        Ok(Self {
            rust_env: read_var("RUST_ENV")?,
            api_host: read_var("API_HOST")?,
            api_port: read_var("API_PORT")?
                .parse::<u16>()
                .map_err(|e| format!("invalid API_PORT: {e}"))?,
            secret_key: read_var("SECRET_KEY")?,
            staff_password: read_var("STAFF_PASSWORD")?,
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),
            storage_root: PathBuf::from(read_optional_string("STORAGE_ROOT", "storage")),
            base_url: read_optional_string("BASE_URL", "http://localhost:8080"),
            confirm_token_ttl_hours: read_optional_i64("CONFIRM_TOKEN_TTL_HOURS", 168)?,
            filament_cents_per_g: read_optional_i64("LAB_RATE_FILAMENT_CENTS_PER_G", 10)?,
            resin_cents_per_g: read_optional_i64("LAB_RATE_RESIN_CENTS_PER_G", 20)?,
            minimum_charge_cents: read_optional_i64("LAB_MINIMUM_CHARGE_CENTS", 300)?,
        })
    }

    pub fn rate_card(&self) -> RateCard {
        RateCard {
            filament_cents_per_g: self.filament_cents_per_g,
            resin_cents_per_g: self.resin_cents_per_g,
            minimum_cents: self.minimum_charge_cents,
        }
    }
}

fn read_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("missing required env var: {key}"))
}

fn read_optional_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<i64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_dotenv_layers() {
    for path in [".env", "../.env"] {
        let _ = dotenvy::from_path_override(path);
    }
}
