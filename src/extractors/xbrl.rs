// src/extractors/xbrl.rs

// --- Imports ---
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::extractors::patterns::{Field, Variant, PATTERNS};
use crate::utils::error::ExtractError;

// --- Data Structures ---
/// Figures extracted from one filing. Zero means "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialFigures {
    pub revenue: i64,
    pub operating_income: i64,
    pub net_income: i64,
    pub total_assets: i64,
    pub net_assets: i64,
    pub current_assets: i64,
    pub liabilities: i64,
    pub current_liabilities: i64,
    pub cash_and_deposits: i64,
    pub shares_issued: i64,
}

impl FinancialFigures {
    fn slot(&mut self, field: Field) -> Option<&mut i64> {
        match field {
            Field::Revenue => Some(&mut self.revenue),
            Field::OperatingIncome => Some(&mut self.operating_income),
            Field::NetIncome => Some(&mut self.net_income),
            Field::TotalAssets => Some(&mut self.total_assets),
            Field::NetAssets => Some(&mut self.net_assets),
            Field::CurrentAssets => Some(&mut self.current_assets),
            Field::Liabilities => Some(&mut self.liabilities),
            Field::CurrentLiabilities => Some(&mut self.current_liabilities),
            Field::CashAndDeposits => Some(&mut self.cash_and_deposits),
            Field::SharesIssued => Some(&mut self.shares_issued),
            Field::OrdinaryIncome => None,
        }
    }

    /// Near-empty filings (cover pages, administrative amendments) carry none
    /// of revenue, total assets or net assets. Income figures alone don't count.
    pub fn is_sufficient(&self) -> bool {
        self.revenue > 0 || self.total_assets > 0 || self.net_assets > 0
    }
}

// --- Resolution ---
/// Which table entry resolved a field, and in which absorbed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub field: Field,
    pub tag: &'static str,
    pub variant: Variant,
    pub value: i64,
    /// Zero-based index of the document, in absorb order.
    pub document: usize,
}

/// Accumulates pattern matches over one or more documents of a filing.
///
/// The first positive match for a field wins, across every absorbed document.
/// Ordinary income is only applied in [`FiguresAccumulator::finish`], and only
/// when no operating income was found anywhere.
#[derive(Debug, Default)]
pub struct FiguresAccumulator {
    figures: FinancialFigures,
    resolved: HashSet<Field>,
    ordinary_income: Option<i64>,
    resolutions: Vec<Resolution>,
    documents: usize,
}

impl FiguresAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the pattern table to one document, returning how many fields it resolved.
    pub fn absorb(&mut self, text: &str) -> usize {
        self.documents += 1;
        let mut newly_resolved = 0;

        for pattern in PATTERNS.iter() {
            let field = pattern.spec.field;
            if self.resolved.contains(&field) {
                continue;
            }
            let Some(value) = pattern.match_value(text) else {
                continue;
            };

            match field {
                Field::OrdinaryIncome => self.ordinary_income = Some(value),
                _ => {
                    if let Some(slot) = self.figures.slot(field) {
                        *slot = value;
                    }
                }
            }
            self.resolved.insert(field);
            self.resolutions.push(Resolution {
                field,
                tag: pattern.spec.tag,
                variant: pattern.spec.variant,
                value,
                document: self.documents - 1,
            });
            newly_resolved += 1;

            if let Variant::Fallback(level) = pattern.spec.variant {
                tracing::debug!("{} resolved by fallback {} ({}): {}", field.name(), level, pattern.spec.tag, value);
            } else {
                tracing::trace!("{} resolved by primary ({}): {}", field.name(), pattern.spec.tag, value);
            }
        }

        newly_resolved
    }

    pub fn is_resolved(&self, field: Field) -> bool {
        self.resolved.contains(&field)
    }

    /// Resolutions so far, in resolution order.
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Applies the ordinary-income rescue and the sufficiency gate.
    pub fn finish(mut self) -> Result<FinancialFigures, ExtractError> {
        if !self.is_resolved(Field::OperatingIncome) {
            if let Some(ordinary) = self.ordinary_income {
                tracing::debug!("operating_income backfilled from ordinary income: {}", ordinary);
                self.figures.operating_income = ordinary;
            }
        }

        if !self.figures.is_sufficient() {
            return Err(ExtractError::InsufficientData);
        }
        Ok(self.figures)
    }
}

/// Extracts figures from a single XBRL document.
pub fn extract_document(text: &str) -> Result<FinancialFigures, ExtractError> {
    let mut acc = FiguresAccumulator::new();
    acc.absorb(text);
    acc.finish()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, ctx: &str, value: &str) -> String {
        format!(r#"<jppfs_cor:{name} contextRef="{ctx}" unitRef="JPY" decimals="-6">{value}</jppfs_cor:{name}>"#)
    }

    fn crp(name: &str, ctx: &str, value: &str) -> String {
        format!(r#"<jpcrp_cor:{name} contextRef="{ctx}" unitRef="JPY" decimals="-6">{value}</jpcrp_cor:{name}>"#)
    }

    #[test]
    fn primary_value_wins_over_fallback() {
        let doc = [
            tag("NetSales", "CurrentYearDuration", "111"),
            crp("NetSalesSummaryOfBusinessResults", "CurrentYearDuration", "999"),
        ]
        .concat();
        let figures = extract_document(&doc).unwrap();
        assert_eq!(figures.revenue, 999);
    }

    #[test]
    fn fallback_used_when_primary_absent() {
        let doc = [
            tag("NetAssets", "CurrentYearInstant_NonConsolidatedMember", "4200"),
            tag("NetSales", "CurrentYearDuration_NonConsolidatedMember", "8800"),
        ]
        .concat();
        let figures = extract_document(&doc).unwrap();
        assert_eq!(figures.net_assets, 4200);
        assert_eq!(figures.revenue, 8800);
    }

    #[test]
    fn consolidated_fallback_beats_non_consolidated_fallback() {
        let doc = [
            tag("Assets", "CurrentYearInstant_NonConsolidatedMember", "10"),
            tag("Assets", "CurrentYearInstant", "20"),
        ]
        .concat();
        let figures = extract_document(&doc).unwrap();
        assert_eq!(figures.total_assets, 20);
    }

    #[test]
    fn zero_and_non_numeric_values_are_not_found() {
        let doc = [
            crp("NetSalesSummaryOfBusinessResults", "CurrentYearDuration", "0"),
            tag("NetSales", "CurrentYearDuration", "n/a"),
            tag("TotalAssets", "CurrentYearInstant", "0"),
            tag("NetAssets", "CurrentYearInstant", "500"),
        ]
        .concat();
        let figures = extract_document(&doc).unwrap();
        assert_eq!(figures.revenue, 0);
        assert_eq!(figures.total_assets, 0);
        assert_eq!(figures.net_assets, 500);
    }

    #[test]
    fn zero_primary_falls_through_to_fallback() {
        let doc = [
            crp("NetSalesSummaryOfBusinessResults", "CurrentYearDuration", "0"),
            tag("NetSales", "CurrentYearDuration", "321"),
        ]
        .concat();
        assert_eq!(extract_document(&doc).unwrap().revenue, 321);
    }

    #[test]
    fn operating_revenue_counts_as_revenue() {
        let doc = tag("OperatingRevenue1", "CurrentYearDuration", "7000");
        assert_eq!(extract_document(&doc).unwrap().revenue, 7000);
    }

    #[test]
    fn ordinary_income_backfills_missing_operating_income() {
        let doc = [
            tag("NetSales", "CurrentYearDuration", "1000"),
            tag("OrdinaryIncome", "CurrentYearDuration", "150"),
        ]
        .concat();
        let figures = extract_document(&doc).unwrap();
        assert_eq!(figures.operating_income, 150);
    }

    #[test]
    fn ordinary_income_never_overrides_operating_income() {
        let doc = [
            crp("OrdinaryIncomeLossSummaryOfBusinessResults", "CurrentYearDuration", "150"),
            tag("NetSales", "CurrentYearDuration", "1000"),
            tag("OperatingIncome", "CurrentYearDuration", "120"),
        ]
        .concat();
        let figures = extract_document(&doc).unwrap();
        assert_eq!(figures.operating_income, 120);
    }

    #[test]
    fn insufficient_when_gate_fields_missing_even_with_income() {
        let doc = [
            tag("OperatingIncome", "CurrentYearDuration", "120"),
            crp("ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults", "CurrentYearDuration", "80"),
        ]
        .concat();
        assert!(matches!(extract_document(&doc), Err(ExtractError::InsufficientData)));
    }

    #[test]
    fn empty_document_is_insufficient() {
        assert!(matches!(extract_document(""), Err(ExtractError::InsufficientData)));
    }

    #[test]
    fn first_document_resolution_wins_across_documents() {
        let mut acc = FiguresAccumulator::new();
        acc.absorb(&tag("NetSales", "CurrentYearDuration_NonConsolidatedMember", "50"));
        // A later document carrying the consolidated primary does not override.
        acc.absorb(&crp("NetSalesSummaryOfBusinessResults", "CurrentYearDuration", "900"));
        acc.absorb(&tag("NetAssets", "CurrentYearInstant", "30"));
        assert_eq!(acc.documents(), 3);
        let figures = acc.finish().unwrap();
        assert_eq!(figures.revenue, 50);
        assert_eq!(figures.net_assets, 30);
    }

    #[test]
    fn rescue_applies_after_all_documents() {
        let mut acc = FiguresAccumulator::new();
        acc.absorb(&[
            tag("NetSales", "CurrentYearDuration", "1000"),
            tag("OrdinaryIncome", "CurrentYearDuration", "150"),
        ]
        .concat());
        acc.absorb(&tag("OperatingIncome", "CurrentYearDuration", "130"));
        assert_eq!(acc.finish().unwrap().operating_income, 130);
    }

    #[test]
    fn full_document_populates_every_field() {
        let doc = [
            crp("NetSalesSummaryOfBusinessResults", "CurrentYearDuration", "45095325000000"),
            tag("OperatingIncome", "CurrentYearDuration", "5352934000000"),
            crp("ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults", "CurrentYearDuration", "4944933000000"),
            crp("TotalAssetsSummaryOfBusinessResults", "CurrentYearInstant", "90114296000000"),
            crp("NetAssetsSummaryOfBusinessResults", "CurrentYearInstant", "36878913000000"),
            tag("CurrentAssets", "CurrentYearInstant", "37000000000000"),
            tag("Liabilities", "CurrentYearInstant", "53000000000000"),
            tag("CurrentLiabilities", "CurrentYearInstant", "30000000000000"),
            tag("CashAndDeposits", "CurrentYearInstant", "9000000000000"),
            crp("TotalNumberOfIssuedSharesSummaryOfBusinessResults", "CurrentYearInstant_NonConsolidatedMember", "15794987460"),
        ]
        .concat();
        let f = extract_document(&doc).unwrap();
        assert_eq!(f.revenue, 45_095_325_000_000);
        assert_eq!(f.operating_income, 5_352_934_000_000);
        assert_eq!(f.net_income, 4_944_933_000_000);
        assert_eq!(f.total_assets, 90_114_296_000_000);
        assert_eq!(f.net_assets, 36_878_913_000_000);
        assert_eq!(f.current_assets, 37_000_000_000_000);
        assert_eq!(f.liabilities, 53_000_000_000_000);
        assert_eq!(f.current_liabilities, 30_000_000_000_000);
        assert_eq!(f.cash_and_deposits, 9_000_000_000_000);
        assert_eq!(f.shares_issued, 15_794_987_460);
    }

    #[test]
    fn resolutions_record_winning_pattern_and_document() {
        let mut acc = FiguresAccumulator::new();
        acc.absorb(&crp("NetSalesSummaryOfBusinessResults", "CurrentYearDuration", "999"));
        acc.absorb(&tag("NetAssets", "CurrentYearInstant_NonConsolidatedMember", "4200"));

        let resolutions = acc.resolutions();
        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].field, Field::Revenue);
        assert_eq!(resolutions[0].tag, "NetSalesSummaryOfBusinessResults");
        assert_eq!(resolutions[0].variant, Variant::Primary);
        assert_eq!(resolutions[0].document, 0);
        assert_eq!(resolutions[1].field, Field::NetAssets);
        assert_eq!(resolutions[1].variant, Variant::Fallback(2));
        assert_eq!(resolutions[1].value, 4200);
        assert_eq!(resolutions[1].document, 1);
    }
}
