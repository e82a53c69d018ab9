// src/collector/mod.rs
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::edinet::models::doc_type_counts;
use crate::edinet::{FilingReference, FilingSource};
use crate::extractors::extract_archive;
use crate::storage::{CompanyRecord, Storage};
use crate::utils::error::{AppError, ExtractError};

/// Counts for one collection pass (one date, or a whole range).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectSummary {
    /// Documents in the list(s), before filtering.
    pub listed: usize,
    /// Financial-statement filings with a usable entity code.
    pub eligible: usize,
    pub stored: usize,
    /// Filings that parsed but carried too little data to keep.
    pub insufficient: usize,
    /// Download, archive or code errors.
    pub failed: usize,
}

impl CollectSummary {
    fn add(&mut self, other: CollectSummary) {
        self.listed += other.listed;
        self.eligible += other.eligible;
        self.stored += other.stored;
        self.insufficient += other.insufficient;
        self.failed += other.failed;
    }
}

/// What one collection run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Exactly this date, whatever the weekday.
    Day(NaiveDate),
    /// Every weekday in `from..=to`.
    Weekdays { from: NaiveDate, to: NaiveDate },
}

pub struct Collector<'a> {
    source: &'a dyn FilingSource,
    storage: &'a Storage,
}

impl<'a> Collector<'a> {
    pub fn new(source: &'a dyn FilingSource, storage: &'a Storage) -> Self {
        Self { source, storage }
    }

    pub async fn collect(&self, window: Window, day_delay: Duration) -> Result<CollectSummary, AppError> {
        match window {
            Window::Day(date) => self.collect_date(date).await,
            Window::Weekdays { from, to } => self.collect_range(from, to, day_delay).await,
        }
    }

    /// Collects every financial filing submitted on `date`.
    ///
    /// Failing to fetch the document list aborts the pass. A single filing
    /// that fails to download or parse is logged and skipped; nothing is
    /// written for it.
    pub async fn collect_date(&self, date: NaiveDate) -> Result<CollectSummary, AppError> {
        let filings = self.source.document_list(date).await?;
        let mut summary = CollectSummary { listed: filings.len(), ..Default::default() };
        tracing::info!("{}: {} documents listed", date, filings.len());
        tracing::debug!("{}: documents by type {:?}", date, doc_type_counts(&filings));

        for filing in filings.iter().filter(|f| f.is_financial_statement()) {
            let code = match filing.entity_code() {
                None => {
                    tracing::debug!("Skip {} ({}): no security code", filing.doc_id, filing.entity_name);
                    continue;
                }
                Some(Err(e)) => {
                    tracing::warn!("Skip {} ({}): {}", filing.doc_id, filing.entity_name, e);
                    summary.failed += 1;
                    continue;
                }
                Some(Ok(code)) => code,
            };
            summary.eligible += 1;
            tracing::info!("Analyzing: {} ({}) DocID: {}", filing.entity_name, code, filing.doc_id);

            match self.process_filing(filing, &code).await {
                Ok(record) => {
                    self.storage.upsert_company(&record)?;
                    summary.stored += 1;
                    tracing::info!(
                        "Stored {} ({}): revenue {}, net assets {}",
                        record.name,
                        record.code,
                        record.figures.revenue,
                        record.figures.net_assets
                    );
                }
                Err(AppError::Extraction(ExtractError::InsufficientData)) => {
                    tracing::warn!("Skip {} ({}): insufficient data in filing", filing.entity_name, code);
                    summary.insufficient += 1;
                }
                Err(e) => {
                    tracing::warn!("Skip {} ({}): {}", filing.entity_name, code, e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "{}: listed {}, eligible {}, stored {}, insufficient {}, failed {}",
            date,
            summary.listed,
            summary.eligible,
            summary.stored,
            summary.insufficient,
            summary.failed
        );
        Ok(summary)
    }

    async fn process_filing(&self, filing: &FilingReference, code: &str) -> Result<CompanyRecord, AppError> {
        let bytes = self.source.archive(filing).await?;
        tracing::debug!("Downloaded archive for {} ({} bytes)", filing.doc_id, bytes.len());
        let figures = extract_archive(&bytes)?;

        let mut record = CompanyRecord::new(code, filing.entity_name.clone(), figures);
        record.doc_id = Some(filing.doc_id.clone());
        record.doc_type = Some(filing.doc_type_code.clone());
        record.submitted_at = Some(filing.submitted_at.clone()).filter(|s| !s.is_empty());
        Ok(record)
    }

    /// Collects every weekday in `from..=to`, pausing `day_delay` between days.
    pub async fn collect_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        day_delay: Duration,
    ) -> Result<CollectSummary, AppError> {
        if from > to {
            return Err(AppError::Config(format!("start date {} is after end date {}", from, to)));
        }

        let mut total = CollectSummary::default();
        for (i, date) in business_days(from, to).enumerate() {
            if i > 0 {
                tokio::time::sleep(day_delay).await;
            }
            total.add(self.collect_date(date).await?);
        }

        tracing::info!(
            "Range {}..={} finished. Stored: {}, Insufficient: {}, Failed: {}",
            from,
            to,
            total.stored,
            total.insufficient,
            total.failed
        );
        Ok(total)
    }
}

/// Calendar days in `from..=to`, skipping Saturdays and Sundays.
pub fn business_days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days()
        .take_while(move |d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}
