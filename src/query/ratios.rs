// src/query/ratios.rs
use serde::Serialize;

use crate::extractors::FinancialFigures;

/// Valuation ratios derived at query time. A ratio whose inputs are missing
/// or non-positive is `None` and omitted from JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComputedRatios {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbr: Option<f64>,
    /// Percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roe: Option<f64>,
    /// Percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_ratio: Option<f64>,
    /// Net current assets (current assets less all liabilities) over market cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_value_ratio: Option<f64>,
}

fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

fn percent(v: f64) -> f64 {
    v * 100.0
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    positive(numerator? / denominator?)
}

impl ComputedRatios {
    pub fn compute(figures: &FinancialFigures, price: Option<f64>) -> Self {
        let price = price.and_then(positive);
        let shares = positive(figures.shares_issued as f64);
        let net_income = positive(figures.net_income as f64);
        let net_assets = positive(figures.net_assets as f64);
        let total_assets = positive(figures.total_assets as f64);
        let net_current_assets = if figures.current_assets > 0 {
            positive((figures.current_assets - figures.liabilities) as f64)
        } else {
            None
        };

        let market_cap = match (price, shares) {
            (Some(p), Some(s)) => positive(p * s),
            _ => None,
        };
        let eps = ratio(net_income, shares);
        let bps = ratio(net_assets, shares);

        Self {
            market_cap,
            eps,
            bps,
            per: ratio(price, eps),
            pbr: ratio(price, bps),
            roe: ratio(net_income.map(percent), net_assets),
            equity_ratio: ratio(net_assets.map(percent), total_assets),
            liquidation_value_ratio: ratio(net_current_assets, market_cap),
        }
    }
}
