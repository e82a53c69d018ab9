// src/query/screen.rs
use serde::Serialize;

use crate::query::{ComputedRatios, StockView};

/// Points per threshold band. The first band an entity reaches is awarded.
const ROE_BANDS: &[(f64, u32)] = &[(15.0, 30), (10.0, 20), (5.0, 10)];
const PER_BANDS: &[(f64, u32)] = &[(10.0, 25), (15.0, 15), (20.0, 5)];
const PBR_BANDS: &[(f64, u32)] = &[(0.8, 25), (1.0, 15), (1.5, 5)];
const EQUITY_BANDS: &[(f64, u32)] = &[(60.0, 20), (40.0, 10)];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenEntry {
    pub code: String,
    pub name: String,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    #[serde(flatten)]
    pub ratios: ComputedRatios,
}

fn at_least(value: Option<f64>, bands: &[(f64, u32)]) -> u32 {
    value
        .and_then(|v| bands.iter().find(|(min, _)| v >= *min))
        .map_or(0, |(_, points)| *points)
}

fn at_most(value: Option<f64>, bands: &[(f64, u32)]) -> u32 {
    value
        .filter(|v| *v > 0.0)
        .and_then(|v| bands.iter().find(|(max, _)| v <= *max))
        .map_or(0, |(_, points)| *points)
}

/// Additive growth/value score: profitable, cheap, well-capitalised.
pub fn score(ratios: &ComputedRatios) -> u32 {
    at_least(ratios.roe, ROE_BANDS)
        + at_most(ratios.per, PER_BANDS)
        + at_most(ratios.pbr, PBR_BANDS)
        + at_least(ratios.equity_ratio, EQUITY_BANDS)
}

/// Scores every entity and sorts by score, highest first. Equal scores keep
/// their input order.
pub fn rank(views: &[StockView]) -> Vec<ScreenEntry> {
    let mut entries: Vec<ScreenEntry> = views
        .iter()
        .map(|v| ScreenEntry {
            code: v.company.code.clone(),
            name: v.company.name.clone(),
            score: score(&v.ratios),
            close: v.latest_price.as_ref().map(|p| p.close),
            ratios: v.ratios,
        })
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::FinancialFigures;
    use crate::storage::CompanyRecord;

    fn ratios(roe: Option<f64>, per: Option<f64>, pbr: Option<f64>, equity: Option<f64>) -> ComputedRatios {
        ComputedRatios { roe, per, pbr, equity_ratio: equity, ..Default::default() }
    }

    fn view(code: &str, r: ComputedRatios) -> StockView {
        StockView {
            company: CompanyRecord::new(code, code, FinancialFigures::default()),
            latest_price: None,
            ratios: r,
        }
    }

    #[test]
    fn bands_award_highest_reached() {
        assert_eq!(score(&ratios(Some(16.0), None, None, None)), 30);
        assert_eq!(score(&ratios(Some(12.0), None, None, None)), 20);
        assert_eq!(score(&ratios(Some(5.0), None, None, None)), 10);
        assert_eq!(score(&ratios(Some(4.9), None, None, None)), 0);
        assert_eq!(score(&ratios(None, Some(8.0), None, None)), 25);
        assert_eq!(score(&ratios(None, Some(21.0), None, None)), 0);
        assert_eq!(score(&ratios(None, None, Some(0.7), None)), 25);
        assert_eq!(score(&ratios(None, None, Some(1.2), None)), 5);
        assert_eq!(score(&ratios(None, None, None, Some(65.0))), 20);
        assert_eq!(score(&ratios(None, None, None, Some(45.0))), 10);
    }

    #[test]
    fn score_is_additive() {
        assert_eq!(score(&ratios(Some(15.0), Some(10.0), Some(0.8), Some(60.0))), 100);
        assert_eq!(score(&ComputedRatios::default()), 0);
    }

    #[test]
    fn ranking_is_stable_descending() {
        let views = vec![
            view("1001", ratios(Some(6.0), None, None, None)),
            view("1002", ratios(Some(20.0), Some(9.0), None, None)),
            view("1003", ratios(None, None, None, Some(45.0))),
            view("1004", ratios(None, None, None, None)),
        ];
        let ranked = rank(&views);
        let order: Vec<_> = ranked.iter().map(|e| (e.code.as_str(), e.score)).collect();
        assert_eq!(order, vec![("1002", 55), ("1001", 10), ("1003", 10), ("1004", 0)]);
    }
}
