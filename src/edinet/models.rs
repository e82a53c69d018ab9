// src/edinet/models.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::error::EdinetError;

/// Document types that carry financial statements: annual, quarterly and
/// semi-annual securities reports, each with its amendment code.
pub const FINANCIAL_DOC_TYPES: &[&str] = &["120", "130", "140", "150", "160", "170"];

/// Response of `GET /documents.json?date=...&type=2`
/// Example: https://api.edinet-fsa.go.jp/api/v2/documents.json?date=2025-06-18&type=2
#[derive(Debug, Deserialize)]
pub struct DocumentListResponse {
    pub metadata: Option<Metadata>,
    pub results: Option<Vec<DocumentEntry>>,
    /// Present instead of `metadata` when the gateway rejects the request.
    #[serde(rename = "StatusCode")]
    pub status_code: Option<u16>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub status: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEntry {
    #[serde(rename = "docID")]
    pub doc_id: String,
    #[serde(rename = "secCode")]
    pub sec_code: Option<String>,
    #[serde(rename = "filerName")]
    pub filer_name: Option<String>,
    #[serde(rename = "submitDateTime", alias = "submissionDateTime")]
    pub submit_date_time: Option<String>,
    #[serde(rename = "docTypeCode")]
    pub doc_type_code: Option<String>,
    #[serde(rename = "docDescription")]
    pub doc_description: Option<String>,
}

impl DocumentListResponse {
    /// Checks the API-level status and converts every entry to a [`FilingReference`].
    pub fn into_filings(self) -> Result<Vec<FilingReference>, EdinetError> {
        if let Some(code) = self.status_code {
            return Err(EdinetError::Api {
                status: code.to_string(),
                message: self.message.unwrap_or_default(),
            });
        }
        if let Some(meta) = &self.metadata {
            if let Some(status) = meta.status.as_deref() {
                if status != "200" {
                    return Err(EdinetError::Api {
                        status: status.to_string(),
                        message: meta.message.clone().unwrap_or_default(),
                    });
                }
            }
        }

        let results = self
            .results
            .ok_or_else(|| EdinetError::Parse("response has no results array".to_string()))?;
        Ok(results.into_iter().map(FilingReference::from).collect())
    }
}

/// One filing seen during a collection pass. Not persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingReference {
    pub doc_id: String,
    pub sec_code: Option<String>,
    pub entity_name: String,
    pub submitted_at: String,
    pub doc_type_code: String,
    pub description: String,
}

impl From<DocumentEntry> for FilingReference {
    fn from(e: DocumentEntry) -> Self {
        Self {
            doc_id: e.doc_id,
            sec_code: e.sec_code.filter(|c| !c.trim().is_empty()),
            entity_name: e.filer_name.unwrap_or_default(),
            submitted_at: e.submit_date_time.unwrap_or_default(),
            doc_type_code: e.doc_type_code.unwrap_or_default(),
            description: e.doc_description.unwrap_or_default(),
        }
    }
}

impl FilingReference {
    pub fn is_financial_statement(&self) -> bool {
        FINANCIAL_DOC_TYPES.contains(&self.doc_type_code.as_str())
    }

    /// Four-character entity code, if the filing has a security code at all.
    pub fn entity_code(&self) -> Option<Result<String, EdinetError>> {
        self.sec_code.as_deref().map(entity_code)
    }

    /// URL of the ZIP archive (`type=1`: XBRL and attachments).
    pub fn archive_url(&self, base: &str) -> String {
        format!("{}/documents/{}?type=1", base.trim_end_matches('/'), self.doc_id)
    }
}

/// Derives the listing code from a five-character security code by dropping
/// the trailing check digit: `"72030"` becomes `"7203"`.
///
/// Codes with fewer than four characters, or with anything but ASCII
/// alphanumerics in the first four, are rejected rather than padded.
pub fn entity_code(sec_code: &str) -> Result<String, EdinetError> {
    let trimmed = sec_code.trim();
    let head: String = trimmed.chars().take(4).collect();
    if head.chars().count() < 4 || !head.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EdinetError::InvalidSecCode(sec_code.to_string()));
    }
    Ok(head.to_ascii_uppercase())
}

/// Number of listed documents per document-type code.
pub fn doc_type_counts(filings: &[FilingReference]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for filing in filings {
        *counts.entry(filing.doc_type_code.as_str()).or_insert(0) += 1;
    }
    counts
}
