// src/prices/client.rs
use std::time::Duration;

use async_trait::async_trait;

use crate::prices::PriceSource;
use crate::utils::error::PriceError;

/// Tokyo Stock Exchange listings are addressed as `<code>.jp`.
const MARKET_SUFFIX: &str = "jp";

/// Daily CSV history from stooq.
#[derive(Debug, Clone)]
pub struct StooqClient {
    http: reqwest::Client,
    base: String,
}

impl StooqClient {
    pub fn new(base: &str) -> Result<Self, PriceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, base: base.to_string() })
    }

    pub fn ticker(code: &str) -> String {
        format!("{}.{}", code.to_ascii_lowercase(), MARKET_SUFFIX)
    }
}

#[async_trait]
impl PriceSource for StooqClient {
    async fn history_csv(&self, code: &str) -> Result<String, PriceError> {
        let ticker = Self::ticker(code);
        tracing::debug!("Downloading price history for {}", ticker);

        let response = self
            .http
            .get(&self.base)
            .query(&[("s", ticker.as_str()), ("i", "d")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for ticker: {}", status, ticker);
            return Err(PriceError::Http(status));
        }
        Ok(response.text().await?)
    }
}
