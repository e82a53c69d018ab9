// src/edinet/mod.rs
pub mod client;
pub mod mock;
pub mod models;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::utils::error::EdinetError;
use crate::utils::Config;

pub use client::EdinetClient;
pub use mock::MockSource;
pub use models::{entity_code, FilingReference};

/// Where filings come from: the live EDINET API or canned mock data.
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Every document submitted on `date`.
    async fn document_list(&self, date: NaiveDate) -> Result<Vec<FilingReference>, EdinetError>;

    /// Raw ZIP archive of one filing.
    async fn archive(&self, filing: &FilingReference) -> Result<Vec<u8>, EdinetError>;
}

/// Picks the live client when a subscription key is configured, mock data otherwise.
pub fn source_from_config(config: &Config) -> Result<Box<dyn FilingSource>, EdinetError> {
    match &config.api_key {
        Some(key) => Ok(Box::new(EdinetClient::new(&config.edinet_base, key, config.request_delay)?)),
        None => {
            tracing::warn!("{} not set. Using MOCK MODE...", crate::utils::config::API_KEY_VAR);
            Ok(Box::new(MockSource::fixed()?))
        }
    }
}
