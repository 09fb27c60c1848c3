// ⚙️ Configuration - environment driven, with an optional .env file

use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "LEDGER_DB_PATH";
pub const BIND_ADDR_VAR: &str = "LEDGER_BIND_ADDR";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

const DEFAULT_DB_PATH: &str = "ledger.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        AppConfig {
            db_path: get(DB_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.db_path),
            bind_addr: get(BIND_ADDR_VAR).unwrap_or(defaults.bind_addr),
            log_filter: get(LOG_FILTER_VAR).unwrap_or(defaults.log_filter),
        }
    }
}
