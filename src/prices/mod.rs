// src/prices/mod.rs
pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;

use crate::storage::{PricePoint, Storage};
use crate::utils::error::{AppError, PriceError};
use crate::utils::Config;

pub use client::StooqClient;

/// Only this many trailing days of history are kept from a download.
pub const RETENTION_DAYS: i64 = 365;

/// Where daily price history comes from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Raw CSV (`Date,Open,High,Low,Close,Volume`) for one entity code.
    async fn history_csv(&self, code: &str) -> Result<String, PriceError>;
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

/// Parses a price CSV, dropping rows older than [`RETENTION_DAYS`] before `today`.
pub fn parse_price_csv(code: &str, text: &str, today: NaiveDate) -> Result<Vec<PricePoint>, PriceError> {
    if !text.trim_start().starts_with("Date") {
        // e.g. "No data" for unknown tickers
        return Err(PriceError::Empty(code.to_string()));
    }

    let cutoff = today - chrono::Duration::days(RETENTION_DAYS);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut points = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        if row.date < cutoff || row.date > today {
            continue;
        }
        points.push(PricePoint::new(
            code,
            row.date,
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume.unwrap_or(0.0).round() as i64,
        ));
    }
    Ok(points)
}

/// Synthetic prices for offline runs: the ten weekdays up to `today`, derived from the code.
#[derive(Debug, Clone)]
pub struct MockPrices {
    today: NaiveDate,
}

impl MockPrices {
    pub fn as_of(today: NaiveDate) -> Self {
        Self { today }
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn history_csv(&self, code: &str) -> Result<String, PriceError> {
        let today = self.today;
        let base = 500.0 + code.bytes().map(|b| f64::from(b % 10)).sum::<f64>() * 150.0;

        let mut days = Vec::new();
        let mut day = today;
        while days.len() < 10 {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                days.push(day);
            }
            day = day.pred_opt().unwrap_or(day);
        }
        days.reverse();

        let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
        for (i, d) in days.iter().enumerate() {
            let close = base + i as f64 * 5.0;
            csv.push_str(&format!(
                "{},{:.1},{:.1},{:.1},{:.1},{}\n",
                d.format("%Y-%m-%d"),
                close - 3.0,
                close + 8.0,
                close - 9.0,
                close,
                100_000 + i * 1_000
            ));
        }
        Ok(csv)
    }
}

/// Live client when a subscription key is configured, synthetic data as of
/// `today` otherwise.
pub fn source_from_config(config: &Config, today: NaiveDate) -> Result<Box<dyn PriceSource>, PriceError> {
    if config.is_mock() {
        tracing::warn!("{} not set. Using mock price data...", crate::utils::config::API_KEY_VAR);
        return Ok(Box::new(MockPrices::as_of(today)));
    }
    Ok(Box::new(StooqClient::new(&config.price_base)?))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PriceSummary {
    pub updated: usize,
    pub failed: usize,
    pub rows: usize,
}

/// Fetches price history for every stored entity, one at a time.
///
/// A failed download or parse is logged and skipped; storage errors abort.
pub async fn run_price_pass(
    storage: &mut Storage,
    source: &dyn PriceSource,
    delay: Duration,
    today: NaiveDate,
) -> Result<PriceSummary, AppError> {
    let codes = storage.company_codes()?;
    tracing::info!("Fetching price history for {} entities", codes.len());

    let mut summary = PriceSummary::default();
    for (i, code) in codes.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }

        let points = match source.history_csv(code).await.and_then(|csv| parse_price_csv(code, &csv, today)) {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("Skip prices for {}: {}", code, e);
                summary.failed += 1;
                continue;
            }
        };

        summary.rows += storage.upsert_prices(&points)?;
        summary.updated += 1;
        tracing::info!("Stored {} price rows for {}", points.len(), code);
    }

    tracing::info!(
        "Price pass finished. Updated: {}, Failed: {}, Rows: {}",
        summary.updated,
        summary.failed,
        summary.rows
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::FinancialFigures;
    use crate::storage::CompanyRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keeps_only_trailing_year() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-04,2500,2550,2490,2540,1000\n\
                   2025-06-02,2800,2850,2790,2840,1200\n\
                   2025-12-25,2900,2950,2890,2945.5,1300\n";
        let points = parse_price_csv("7203", csv, date(2025, 12, 26)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(2025, 6, 2));
        assert_eq!(points[1].close, 2945.5);
        assert_eq!(points[1].volume, 1300);
        assert!(points.iter().all(|p| p.code == "7203"));
    }

    #[test]
    fn missing_volume_defaults_to_zero() {
        let csv = "Date,Open,High,Low,Close,Volume\n2025-12-25,1,2,0.5,1.5,\n";
        let points = parse_price_csv("7203", csv, date(2025, 12, 26)).unwrap();
        assert_eq!(points[0].volume, 0);
    }

    #[test]
    fn no_data_body_is_empty_error() {
        assert!(matches!(
            parse_price_csv("0000", "No data", date(2025, 12, 26)),
            Err(PriceError::Empty(_))
        ));
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let csv = "Date,Open,High,Low,Close,Volume\nnot-a-date,1,2,3,4,5\n";
        assert!(matches!(parse_price_csv("7203", csv, date(2025, 12, 26)), Err(PriceError::Csv(_))));
    }

    #[tokio::test]
    async fn mock_prices_skip_weekends() {
        // 2025-12-28 is a Sunday
        let csv = MockPrices::as_of(date(2025, 12, 28)).history_csv("7203").await.unwrap();
        let points = parse_price_csv("7203", &csv, date(2025, 12, 28)).unwrap();
        assert_eq!(points.len(), 10);
        assert!(points.iter().all(|p| !matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert_eq!(points.last().unwrap().date, date(2025, 12, 26));
    }

    #[tokio::test]
    async fn price_pass_is_idempotent() {
        let mut storage = Storage::in_memory().unwrap();
        storage
            .upsert_company(&CompanyRecord::new("7203", "トヨタ自動車株式会社", FinancialFigures::default()))
            .unwrap();
        let today = date(2025, 12, 26);
        let source = MockPrices::as_of(today);

        let first = run_price_pass(&mut storage, &source, Duration::ZERO, today).await.unwrap();
        let second = run_price_pass(&mut storage, &source, Duration::ZERO, today).await.unwrap();
        assert_eq!(first, PriceSummary { updated: 1, failed: 0, rows: 10 });
        assert_eq!(second, first);
        assert_eq!(storage.price_history("7203").unwrap().len(), 10);
    }

    #[tokio::test]
    async fn mock_source_ends_at_pass_date() {
        let config = Config {
            api_key: None,
            ..Config::from_env(".", Duration::ZERO, Duration::ZERO, Duration::ZERO)
        };
        let today = date(2025, 6, 20);
        let source = source_from_config(&config, today).unwrap();
        let points = parse_price_csv("7203", &source.history_csv("7203").await.unwrap(), today).unwrap();
        assert_eq!(points.last().unwrap().date, today);
    }
}
