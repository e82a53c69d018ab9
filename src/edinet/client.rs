// src/edinet/client.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header;

use crate::edinet::models::{DocumentListResponse, FilingReference};
use crate::edinet::FilingSource;
use crate::utils::error::EdinetError;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
/// Document list `type=2`: metadata plus the submitted-document listing.
const LIST_TYPE_WITH_DOCUMENTS: u8 = 2;

/// Live EDINET API v2 client.
#[derive(Debug, Clone)]
pub struct EdinetClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    request_delay: Duration,
}

impl EdinetClient {
    pub fn new(base: &str, api_key: &str, request_delay: Duration) -> Result<Self, EdinetError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            request_delay,
        })
    }

    pub fn list_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/documents.json?date={}&type={}",
            self.base,
            date.format("%Y-%m-%d"),
            LIST_TYPE_WITH_DOCUMENTS
        )
    }

    /// Sends an authenticated GET and checks the HTTP status.
    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, EdinetError> {
        // --- Basic Rate Limiting ---
        // Requests are sequential, so a fixed pause is enough.
        tokio::time::sleep(self.request_delay).await;

        let response = self
            .http
            .get(url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, accept)
            .send()
            .await?; // Propagates reqwest::Error as EdinetError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received {} - check {}.", status, crate::utils::config::API_KEY_VAR);
            }
            return Err(EdinetError::Http(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl FilingSource for EdinetClient {
    async fn document_list(&self, date: NaiveDate) -> Result<Vec<FilingReference>, EdinetError> {
        let url = self.list_url(date);
        tracing::info!("Fetching EDINET document list for {}", date);

        let body = self.get(&url, "application/json").await?.text().await?;
        let parsed: DocumentListResponse = serde_json::from_str(&body)
            .map_err(|e| EdinetError::Parse(format!("{} (body starts with {:?})", e, body.chars().take(200).collect::<String>())))?;

        let filings = parsed.into_filings()?;
        tracing::debug!("EDINET returned {} documents for {}", filings.len(), date);
        Ok(filings)
    }

    async fn archive(&self, filing: &FilingReference) -> Result<Vec<u8>, EdinetError> {
        let url = filing.archive_url(&self.base);
        tracing::debug!("Downloading archive from: {}", url);

        let bytes = self.get(&url, "application/octet-stream,*/*").await?.bytes().await?;
        tracing::debug!("Downloaded {} bytes for {}", bytes.len(), filing.doc_id);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_http::serve_status;
    use reqwest::StatusCode;

    #[test]
    fn list_url_has_date_and_type() {
        let client = EdinetClient::new("https://api.edinet-fsa.go.jp/api/v2/", "key", Duration::ZERO).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        assert_eq!(
            client.list_url(date),
            "https://api.edinet-fsa.go.jp/api/v2/documents.json?date=2025-12-25&type=2"
        );
    }

    #[tokio::test]
    async fn rejected_key_maps_to_http_error() {
        let base = serve_status(StatusCode::UNAUTHORIZED).await;
        let client = EdinetClient::new(&base, "bad-key", Duration::ZERO).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();

        match client.document_list(date).await {
            Err(EdinetError::Http(status)) => assert_eq!(status, StatusCode::UNAUTHORIZED),
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }
}
