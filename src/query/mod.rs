// src/query/mod.rs
pub mod ratios;
pub mod screen;

use serde::Serialize;

use crate::storage::{CompanyRecord, PricePoint, Storage};
use crate::utils::error::StorageError;

pub use ratios::ComputedRatios;
pub use screen::{rank, ScreenEntry};

/// One row of the stock listing: stored figures, latest price, derived ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub company: CompanyRecord,
    pub latest_price: Option<PricePoint>,
    pub ratios: ComputedRatios,
}

impl StockView {
    pub fn new(company: CompanyRecord, latest_price: Option<PricePoint>) -> Self {
        let ratios = ComputedRatios::compute(&company.figures, latest_price.as_ref().map(|p| p.close));
        Self { company, latest_price, ratios }
    }
}

pub fn stock_listing(storage: &Storage) -> Result<Vec<StockView>, StorageError> {
    Ok(storage
        .companies_with_latest_price()?
        .into_iter()
        .map(|(company, price)| StockView::new(company, price))
        .collect())
}

pub fn screen(storage: &Storage) -> Result<Vec<ScreenEntry>, StorageError> {
    Ok(rank(&stock_listing(storage)?))
}
