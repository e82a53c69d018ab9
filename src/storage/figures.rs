// src/storage/figures.rs
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::extractors::FinancialFigures;
use crate::storage::{nullable, PricePoint, Storage};
use crate::utils::error::StorageError;

/// Stored form of one entity's latest figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub code: String,
    pub name: String,
    pub doc_id: Option<String>,
    pub doc_type: Option<String>,
    pub submitted_at: Option<String>,
    pub updated_at: String,
    #[serde(flatten)]
    pub figures: FinancialFigures,
}

impl CompanyRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, figures: FinancialFigures) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            doc_id: None,
            doc_type: None,
            submitted_at: None,
            updated_at: chrono::Utc::now().to_rfc3339(),
            figures,
        }
    }
}

const COMPANY_COLUMNS: &str = "s.code, s.name, s.doc_id, s.doc_type, s.submitted_at, s.updated_at,
    s.net_sales, s.operating_income, s.net_income, s.total_assets, s.net_assets,
    s.current_assets, s.liabilities, s.current_liabilities, s.cash_and_deposits, s.shares_issued";
const COMPANY_COLUMN_COUNT: usize = 16;

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<CompanyRecord> {
    let amount = |i: usize| -> rusqlite::Result<i64> { Ok(row.get::<_, Option<i64>>(i)?.unwrap_or(0)) };
    Ok(CompanyRecord {
        code: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        doc_id: row.get(2)?,
        doc_type: row.get(3)?,
        submitted_at: row.get(4)?,
        updated_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        figures: FinancialFigures {
            revenue: amount(6)?,
            operating_income: amount(7)?,
            net_income: amount(8)?,
            total_assets: amount(9)?,
            net_assets: amount(10)?,
            current_assets: amount(11)?,
            liabilities: amount(12)?,
            current_liabilities: amount(13)?,
            cash_and_deposits: amount(14)?,
            shares_issued: amount(15)?,
        },
    })
}

impl Storage {
    /// Inserts or replaces the single row for `record.code`.
    pub fn upsert_company(&self, record: &CompanyRecord) -> Result<(), StorageError> {
        let f = &record.figures;
        self.conn().execute(
            "INSERT OR REPLACE INTO stocks (
                code, name, doc_id, doc_type, submitted_at, updated_at,
                net_sales, operating_income, net_income, total_assets, net_assets,
                current_assets, liabilities, current_liabilities, cash_and_deposits, shares_issued
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.code,
                record.name,
                record.doc_id,
                record.doc_type,
                record.submitted_at,
                record.updated_at,
                nullable(f.revenue),
                nullable(f.operating_income),
                nullable(f.net_income),
                nullable(f.total_assets),
                nullable(f.net_assets),
                nullable(f.current_assets),
                nullable(f.liabilities),
                nullable(f.current_liabilities),
                nullable(f.cash_and_deposits),
                nullable(f.shares_issued),
            ],
        )?;
        tracing::debug!("Stored figures for {}", record.code);
        Ok(())
    }

    #[cfg(test)]
    pub fn company(&self, code: &str) -> Result<Option<CompanyRecord>, StorageError> {
        use rusqlite::OptionalExtension;

        let sql = format!("SELECT {} FROM stocks s WHERE s.code = ?1", COMPANY_COLUMNS);
        Ok(self.conn().query_row(&sql, [code], company_from_row).optional()?)
    }

    #[cfg(test)]
    pub fn companies(&self) -> Result<Vec<CompanyRecord>, StorageError> {
        let sql = format!("SELECT {} FROM stocks s ORDER BY s.code ASC", COMPANY_COLUMNS);
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map([], company_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn company_codes(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn().prepare("SELECT code FROM stocks ORDER BY code ASC")?;
        let codes = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<_>, _>>()?;
        Ok(codes)
    }

    /// Every company joined with its most recent price point, if any.
    pub fn companies_with_latest_price(&self) -> Result<Vec<(CompanyRecord, Option<PricePoint>)>, StorageError> {
        let sql = format!(
            "SELECT {}, p.date, p.open, p.high, p.low, p.close, p.volume
             FROM stocks s
             LEFT JOIN prices p
               ON p.code = s.code
              AND p.date = (SELECT MAX(date) FROM prices WHERE code = s.code)
             ORDER BY s.code ASC",
            COMPANY_COLUMNS
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let company = company_from_row(row)?;
                let price = PricePoint::from_joined_row(&company.code, row, COMPANY_COLUMN_COUNT)?;
                Ok((company, price))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
