// src/extractors/patterns.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

// --- Logical Fields ---
/// A logical financial field. Several tag patterns may resolve the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Revenue,
    OperatingIncome,
    /// Rescue value for `OperatingIncome`; never stored on its own.
    OrdinaryIncome,
    NetIncome,
    TotalAssets,
    NetAssets,
    CurrentAssets,
    Liabilities,
    CurrentLiabilities,
    CashAndDeposits,
    SharesIssued,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Revenue => "revenue",
            Field::OperatingIncome => "operating_income",
            Field::OrdinaryIncome => "ordinary_income",
            Field::NetIncome => "net_income",
            Field::TotalAssets => "total_assets",
            Field::NetAssets => "net_assets",
            Field::CurrentAssets => "current_assets",
            Field::Liabilities => "liabilities",
            Field::CurrentLiabilities => "current_liabilities",
            Field::CashAndDeposits => "cash_and_deposits",
            Field::SharesIssued => "shares_issued",
        }
    }
}

// --- Context Classes ---
/// Which `contextRef` values a pattern accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextClass {
    /// Consolidated flow for the current period.
    Duration,
    /// Consolidated balance at the end of the current period.
    Instant,
    /// `Duration`, also admitting the non-consolidated scope.
    DurationAnyScope,
    /// `Instant`, also admitting the non-consolidated scope.
    InstantAnyScope,
    /// Cover-page values as of the filing date.
    FilingDate,
}

impl ContextClass {
    fn regex_fragment(self) -> &'static str {
        match self {
            ContextClass::Duration => "(?:CurrentYearDuration|InterimDuration|CurrentYTDDuration)",
            ContextClass::Instant => "(?:CurrentYearInstant|InterimInstant|CurrentQuarterInstant)",
            ContextClass::DurationAnyScope => {
                "(?:CurrentYearDuration|InterimDuration|CurrentYTDDuration)(?:_NonConsolidatedMember)?"
            }
            ContextClass::InstantAnyScope => {
                "(?:CurrentYearInstant|InterimInstant|CurrentQuarterInstant)(?:_NonConsolidatedMember)?"
            }
            ContextClass::FilingDate => "FilingDateInstant",
        }
    }
}

/// Primary patterns target summary tags in a consolidated context; fallbacks
/// are tried in ascending level once the primary has not resolved the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Primary,
    Fallback(u8),
}

// --- Pattern Table ---
#[derive(Debug, Clone, Copy)]
pub struct TagPattern {
    pub field: Field,
    /// Regex fragment for the local tag name (namespace prefix is optional).
    pub tag: &'static str,
    pub context: ContextClass,
    pub variant: Variant,
}

const fn pat(field: Field, tag: &'static str, context: ContextClass, variant: Variant) -> TagPattern {
    TagPattern { field, tag, context, variant }
}

use ContextClass::*;
use Field::*;
use Variant::*;

/// Declared order is resolution order: the first positive match per field wins.
pub const TAG_PATTERNS: &[TagPattern] = &[
    // Revenue. Banks and insurers report operating revenues instead of net sales.
    pat(Revenue, "NetSalesSummaryOfBusinessResults", Duration, Primary),
    pat(Revenue, r"OperatingRevenues?\d?SummaryOfBusinessResults", Duration, Fallback(1)),
    pat(Revenue, "RevenueIFRSSummaryOfBusinessResults", Duration, Fallback(1)),
    pat(Revenue, "NetSales", Duration, Fallback(2)),
    pat(Revenue, r"OperatingRevenues?\d?", Duration, Fallback(2)),
    pat(Revenue, "NetSalesSummaryOfBusinessResults", DurationAnyScope, Fallback(3)),
    pat(Revenue, "NetSales", DurationAnyScope, Fallback(3)),
    pat(Revenue, r"OperatingRevenues?\d?", DurationAnyScope, Fallback(3)),
    // Operating income
    pat(OperatingIncome, "OperatingIncome", Duration, Primary),
    pat(OperatingIncome, "OperatingProfitLossIFRS", Duration, Fallback(1)),
    pat(OperatingIncome, "OperatingIncome", DurationAnyScope, Fallback(2)),
    // Ordinary income (rescue for operating income)
    pat(OrdinaryIncome, "OrdinaryIncomeLossSummaryOfBusinessResults", Duration, Primary),
    pat(OrdinaryIncome, "OrdinaryIncome", Duration, Fallback(1)),
    pat(OrdinaryIncome, "OrdinaryIncomeLossSummaryOfBusinessResults", DurationAnyScope, Fallback(2)),
    pat(OrdinaryIncome, "OrdinaryIncome", DurationAnyScope, Fallback(2)),
    // Net income
    pat(NetIncome, "ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults", Duration, Primary),
    pat(NetIncome, "ProfitLossAttributableToOwnersOfParent", Duration, Fallback(1)),
    pat(NetIncome, "ProfitLossAttributableToOwnersOfParentIFRSSummaryOfBusinessResults", Duration, Fallback(1)),
    pat(NetIncome, "NetIncomeLossSummaryOfBusinessResults", DurationAnyScope, Fallback(2)),
    pat(NetIncome, "ProfitLoss", DurationAnyScope, Fallback(3)),
    // Total assets
    pat(TotalAssets, "TotalAssetsSummaryOfBusinessResults", Instant, Primary),
    pat(TotalAssets, "Assets", Instant, Fallback(1)),
    pat(TotalAssets, "TotalAssetsIFRSSummaryOfBusinessResults", Instant, Fallback(1)),
    pat(TotalAssets, "TotalAssetsSummaryOfBusinessResults", InstantAnyScope, Fallback(2)),
    pat(TotalAssets, "Assets", InstantAnyScope, Fallback(2)),
    // Net assets
    pat(NetAssets, "NetAssetsSummaryOfBusinessResults", Instant, Primary),
    pat(NetAssets, "NetAssets", Instant, Fallback(1)),
    pat(NetAssets, "EquityAttributableToOwnersOfParentIFRSSummaryOfBusinessResults", Instant, Fallback(1)),
    pat(NetAssets, "NetAssetsSummaryOfBusinessResults", InstantAnyScope, Fallback(2)),
    pat(NetAssets, "NetAssets", InstantAnyScope, Fallback(2)),
    // Balance sheet line items
    pat(CurrentAssets, "CurrentAssets", Instant, Primary),
    pat(CurrentAssets, "CurrentAssets", InstantAnyScope, Fallback(1)),
    pat(Liabilities, "Liabilities", Instant, Primary),
    pat(Liabilities, "Liabilities", InstantAnyScope, Fallback(1)),
    pat(CurrentLiabilities, "CurrentLiabilities", Instant, Primary),
    pat(CurrentLiabilities, "CurrentLiabilities", InstantAnyScope, Fallback(1)),
    pat(CashAndDeposits, "CashAndDeposits", Instant, Primary),
    pat(CashAndDeposits, "CashAndCashEquivalentsSummaryOfBusinessResults", Instant, Fallback(1)),
    pat(CashAndDeposits, "CashAndDeposits", InstantAnyScope, Fallback(2)),
    // Shares are disclosed for the filer itself, so the primary admits any scope.
    pat(SharesIssued, "TotalNumberOfIssuedSharesSummaryOfBusinessResults", InstantAnyScope, Primary),
    pat(SharesIssued, "NumberOfIssuedSharesAsOfFilingDateIssuedSharesTotalNumberOfSharesEtc", FilingDate, Fallback(1)),
    pat(SharesIssued, "NumberOfIssuedSharesAsOfFiscalYearEndIssuedSharesTotalNumberOfSharesEtc", InstantAnyScope, Fallback(2)),
];

// --- Compiled Patterns (Lazy Static) ---
#[derive(Debug)]
pub struct CompiledPattern {
    pub spec: TagPattern,
    regex: Regex,
}

impl CompiledPattern {
    fn compile(spec: TagPattern) -> Result<Self, regex::Error> {
        let source = format!(
            r#"<(?:[\w\-]+:)?{}\s[^>]*?\bcontextRef="{}"[^>]*>([^<]*)</"#,
            spec.tag,
            spec.context.regex_fragment()
        );
        Ok(Self { spec, regex: Regex::new(&source)? })
    }

    /// Text content of the first element this pattern matches.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Positive integer value of the first match. Zero, negative and
    /// non-numeric captures count as no match.
    pub fn match_value(&self, text: &str) -> Option<i64> {
        self.capture(text).and_then(parse_amount)
    }
}

pub static PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    TAG_PATTERNS
        .iter()
        .filter_map(|spec| match CompiledPattern::compile(*spec) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!("Dropping invalid tag pattern {}: {}", spec.tag, e);
                None
            }
        })
        .collect()
});

/// Parses an XBRL numeric literal, tolerating surrounding whitespace and
/// thousands separators. Only positive values are accepted.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<i64>() {
        Ok(v) if v > 0 => Some(v),
        _ => None,
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_for(field: Field, tag: &str, context: ContextClass) -> &'static CompiledPattern {
        PATTERNS
            .iter()
            .find(|p| p.spec.field == field && p.spec.tag == tag && p.spec.context == context)
            .expect("pattern present in table")
    }

    #[test]
    fn every_declared_pattern_compiles() {
        assert_eq!(PATTERNS.len(), TAG_PATTERNS.len());
    }

    #[test]
    fn each_field_has_exactly_one_primary() {
        let fields = [
            Revenue, OperatingIncome, OrdinaryIncome, NetIncome, TotalAssets, NetAssets,
            CurrentAssets, Liabilities, CurrentLiabilities, CashAndDeposits, SharesIssued,
        ];
        for field in fields {
            let primaries = TAG_PATTERNS
                .iter()
                .filter(|p| p.field == field && p.variant == Primary)
                .count();
            assert_eq!(primaries, 1, "field {}", field.name());
        }
    }

    #[test]
    fn primary_comes_before_fallbacks() {
        let first_revenue = TAG_PATTERNS.iter().find(|p| p.field == Revenue).unwrap();
        assert_eq!(first_revenue.variant, Primary);
    }

    #[test]
    fn matches_prefixed_tag_in_consolidated_context() {
        let p = pattern_for(Revenue, "NetSales", Duration);
        let xml = r#"<jppfs_cor:NetSales contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">1234000000</jppfs_cor:NetSales>"#;
        assert_eq!(p.match_value(xml), Some(1_234_000_000));
    }

    #[test]
    fn consolidated_context_rejects_non_consolidated_scope() {
        let p = pattern_for(Revenue, "NetSales", Duration);
        let xml = r#"<jppfs_cor:NetSales contextRef="CurrentYearDuration_NonConsolidatedMember" unitRef="JPY">500</jppfs_cor:NetSales>"#;
        assert_eq!(p.match_value(xml), None);

        let relaxed = pattern_for(Revenue, "NetSales", DurationAnyScope);
        assert_eq!(relaxed.match_value(xml), Some(500));
    }

    #[test]
    fn line_item_tag_does_not_match_longer_tag_names() {
        let assets = pattern_for(TotalAssets, "Assets", Instant);
        let xml = r#"<jppfs_cor:CurrentAssets contextRef="CurrentYearInstant" unitRef="JPY">10</jppfs_cor:CurrentAssets>"#;
        assert_eq!(assets.match_value(xml), None);

        let net_sales = pattern_for(Revenue, "NetSales", Duration);
        let summary = r#"<jpcrp_cor:NetSalesSummaryOfBusinessResults contextRef="CurrentYearDuration" unitRef="JPY">10</jpcrp_cor:NetSalesSummaryOfBusinessResults>"#;
        assert_eq!(net_sales.match_value(summary), None);
    }

    #[test]
    fn prior_year_context_is_ignored() {
        let p = pattern_for(NetAssets, "NetAssets", Instant);
        let xml = r#"<jppfs_cor:NetAssets contextRef="Prior1YearInstant" unitRef="JPY">999</jppfs_cor:NetAssets>"#;
        assert_eq!(p.match_value(xml), None);
    }

    #[test]
    fn nil_elements_do_not_match() {
        let p = pattern_for(NetAssets, "NetAssets", Instant);
        let xml = r#"<jppfs_cor:NetAssets contextRef="CurrentYearInstant" unitRef="JPY" xsi:nil="true"/><jppfs_cor:Other>5</jppfs_cor:Other>"#;
        assert_eq!(p.match_value(xml), None);
    }

    #[test]
    fn parse_amount_rejects_placeholders() {
        assert_eq!(parse_amount(" 1,200 "), Some(1200));
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-35"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }
}
