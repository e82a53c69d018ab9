// src/utils/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::error::AppError;

pub const API_KEY_VAR: &str = "EDINET_API_KEY";
pub const EDINET_BASE_VAR: &str = "EDINET_API_BASE";
pub const PRICE_BASE_VAR: &str = "PRICE_API_BASE";

const DEFAULT_EDINET_BASE: &str = "https://api.edinet-fsa.go.jp/api/v2";
const DEFAULT_PRICE_BASE: &str = "https://stooq.com/q/d/l/";
pub const DB_FILE_NAME: &str = "stock_data.db";

/// Runtime settings shared by every mode, merged from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Subscription key. `None` switches every network mode to mock data.
    pub api_key: Option<String>,
    pub edinet_base: String,
    pub price_base: String,
    pub data_dir: PathBuf,
    /// Pause before each EDINET request.
    pub request_delay: Duration,
    /// Pause between calendar days in batch mode.
    pub day_delay: Duration,
    /// Pause between per-entity price downloads.
    pub price_delay: Duration,
}

impl Config {
    pub fn from_env(
        data_dir: impl AsRef<Path>,
        request_delay: Duration,
        day_delay: Duration,
        price_delay: Duration,
    ) -> Self {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            api_key,
            edinet_base: std::env::var(EDINET_BASE_VAR)
                .unwrap_or_else(|_| DEFAULT_EDINET_BASE.to_string()),
            price_base: std::env::var(PRICE_BASE_VAR)
                .unwrap_or_else(|_| DEFAULT_PRICE_BASE.to_string()),
            data_dir: data_dir.as_ref().to_path_buf(),
            request_delay,
            day_delay,
            price_delay,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.api_key.is_none()
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Creates the data directory if it doesn't exist.
    pub fn ensure_data_dir(&self) -> Result<(), AppError> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)?;
            tracing::info!("Created data directory {}", self.data_dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_lives_in_data_dir() {
        let config = Config::from_env("./data", Duration::ZERO, Duration::ZERO, Duration::ZERO);
        assert_eq!(config.db_path(), PathBuf::from("./data").join(DB_FILE_NAME));
    }

    #[test]
    fn ensure_data_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let config = Config::from_env(&nested, Duration::ZERO, Duration::ZERO, Duration::ZERO);
        config.ensure_data_dir().unwrap();
        assert!(nested.is_dir());
    }
}
