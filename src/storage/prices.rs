// src/storage/prices.rs
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::storage::Storage;
use crate::utils::error::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One daily bar, keyed by (code, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PricePoint {
    pub fn new(code: impl Into<String>, date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Self {
        Self { code: code.into(), date, open, high, low, close, volume }
    }

    fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw: String = row.get(1)?;
        Ok(Self {
            code: row.get(0)?,
            date: Self::parse_date(1, &raw)?,
            open: row.get(2)?,
            high: row.get(3)?,
            low: row.get(4)?,
            close: row.get(5)?,
            volume: row.get(6)?,
        })
    }

    /// Reads the LEFT JOINed price columns starting at `offset`; `None` when
    /// the company has no price rows.
    pub(crate) fn from_joined_row(code: &str, row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Self>> {
        let Some(raw) = row.get::<_, Option<String>>(offset)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            code: code.to_string(),
            date: Self::parse_date(offset, &raw)?,
            open: row.get(offset + 1)?,
            high: row.get(offset + 2)?,
            low: row.get(offset + 3)?,
            close: row.get(offset + 4)?,
            volume: row.get(offset + 5)?,
        }))
    }
}

impl Storage {
    /// Writes price points in one transaction. Re-ingesting a (code, date)
    /// replaces the stored bar.
    pub fn upsert_prices(&mut self, points: &[PricePoint]) -> Result<usize, StorageError> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO prices (code, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(code, date) DO UPDATE SET
                    open = excluded.open, high = excluded.high, low = excluded.low,
                    close = excluded.close, volume = excluded.volume",
            )?;
            for p in points {
                stmt.execute(params![
                    p.code,
                    p.date.format(DATE_FORMAT).to_string(),
                    p.open,
                    p.high,
                    p.low,
                    p.close,
                    p.volume
                ])?;
            }
        }
        tx.commit()?;
        Ok(points.len())
    }

    /// Price history for one code, oldest first.
    pub fn price_history(&self, code: &str) -> Result<Vec<PricePoint>, StorageError> {
        let mut stmt = self.conn().prepare(
            "SELECT code, date, open, high, low, close, volume
             FROM prices WHERE code = ?1 ORDER BY date ASC",
        )?;
        let rows = stmt.query_map([code], PricePoint::from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
