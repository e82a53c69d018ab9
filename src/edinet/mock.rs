// src/edinet/mock.rs
use std::collections::HashMap;
use std::io::{Cursor, Write};

use async_trait::async_trait;
use chrono::NaiveDate;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::edinet::models::{DocumentListResponse, FilingReference};
use crate::edinet::FilingSource;
use crate::utils::error::EdinetError;

/// Offline stand-in for the EDINET API.
///
/// The document list is kept as raw JSON so it goes through the same
/// deserialization as a live response. Unknown document ids answer 404.
#[derive(Debug, Clone)]
pub struct MockSource {
    list_json: String,
    archives: HashMap<String, Vec<u8>>,
}

impl MockSource {
    pub fn new(list_json: impl Into<String>, archives: HashMap<String, Vec<u8>>) -> Self {
        Self { list_json: list_json.into(), archives }
    }

    /// The canned data used when no subscription key is configured.
    pub fn fixed() -> Result<Self, EdinetError> {
        let mut archives = HashMap::new();
        archives.insert(
            "S100MOCK1".to_string(),
            build_zip(&[
                ("XBRL/PublicDoc/jpcrp030000-asr-001_E02144-000_2025-03-31_01_2025-06-18.xbrl", MOCK_ANNUAL_XBRL),
                ("XBRL/AuditDoc/jpaud-aar-cn-001_E02144-000_2025-03-31_01_2025-06-18.xbrl", MOCK_AUDIT_XBRL),
                ("XBRL/PublicDoc/0101010_honbun_jpcrp030000-asr-001.htm", "<html><body>本文</body></html>"),
            ])
            .map_err(|e| EdinetError::Parse(e.to_string()))?,
        );
        archives.insert(
            "S100MOCK2".to_string(),
            build_zip(&[("XBRL/PublicDoc/jpcrp040300-ssr-001_E01777-000_2025-09-30_01_2025-11-13.xbrl", MOCK_INTERIM_XBRL)])
                .map_err(|e| EdinetError::Parse(e.to_string()))?,
        );
        archives.insert(
            "S100MOCK5".to_string(),
            build_zip(&[("XBRL/PublicDoc/jpcrp030000-asr-002_E03606-000_2025-03-31_02_2025-06-20.xbrl", MOCK_COVER_ONLY_XBRL)])
                .map_err(|e| EdinetError::Parse(e.to_string()))?,
        );
        Ok(Self::new(MOCK_DOCUMENT_LIST, archives))
    }
}

#[async_trait]
impl FilingSource for MockSource {
    async fn document_list(&self, date: NaiveDate) -> Result<Vec<FilingReference>, EdinetError> {
        tracing::info!("Serving mock document list for {}", date);
        let parsed: DocumentListResponse =
            serde_json::from_str(&self.list_json).map_err(|e| EdinetError::Parse(e.to_string()))?;
        parsed.into_filings()
    }

    async fn archive(&self, filing: &FilingReference) -> Result<Vec<u8>, EdinetError> {
        self.archives
            .get(&filing.doc_id)
            .cloned()
            .ok_or(EdinetError::Http(reqwest::StatusCode::NOT_FOUND))
    }
}

/// Builds an in-memory ZIP from (path, content) pairs.
pub fn build_zip(entries: &[(&str, &str)]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

const MOCK_DOCUMENT_LIST: &str = r#"{
  "metadata": {"title": "mock", "status": "200", "message": "OK"},
  "results": [
    {"docID": "S100MOCK1", "secCode": "72030", "filerName": "トヨタ自動車株式会社",
     "submitDateTime": "2025-06-18 15:00", "docTypeCode": "120", "docDescription": "有価証券報告書－第121期"},
    {"docID": "S100MOCK2", "secCode": "67580", "filerName": "ソニーグループ株式会社",
     "submitDateTime": "2025-11-13 15:30", "docTypeCode": "160", "docDescription": "半期報告書－第109期"},
    {"docID": "S100MOCK3", "secCode": "99840", "filerName": "ソフトバンクグループ株式会社",
     "submitDateTime": "2025-06-20 09:00", "docTypeCode": "350", "docDescription": "臨時報告書"},
    {"docID": "S100MOCK4", "secCode": null, "filerName": "モックアセットマネジメント株式会社",
     "submitDateTime": "2025-06-20 10:00", "docTypeCode": "120", "docDescription": "有価証券報告書（内国投資信託受益証券）"},
    {"docID": "S100MOCK5", "secCode": "83060", "filerName": "株式会社三菱ＵＦＪフィナンシャル・グループ",
     "submitDateTime": "2025-06-20 11:00", "docTypeCode": "130", "docDescription": "訂正有価証券報告書"}
  ]
}"#;

const MOCK_ANNUAL_XBRL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">
<jpcrp_cor:NetSalesSummaryOfBusinessResults contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">48036704000000</jpcrp_cor:NetSalesSummaryOfBusinessResults>
<jpcrp_cor:NetSalesSummaryOfBusinessResults contextRef="Prior1YearDuration" unitRef="JPY" decimals="-6">45095325000000</jpcrp_cor:NetSalesSummaryOfBusinessResults>
<jppfs_cor:OperatingIncome contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">4795586000000</jppfs_cor:OperatingIncome>
<jpcrp_cor:ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">4765086000000</jpcrp_cor:ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults>
<jpcrp_cor:TotalAssetsSummaryOfBusinessResults contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">93601350000000</jpcrp_cor:TotalAssetsSummaryOfBusinessResults>
<jpcrp_cor:NetAssetsSummaryOfBusinessResults contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">38429706000000</jpcrp_cor:NetAssetsSummaryOfBusinessResults>
<jppfs_cor:CurrentAssets contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">38000000000000</jppfs_cor:CurrentAssets>
<jppfs_cor:Liabilities contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">55171644000000</jppfs_cor:Liabilities>
<jppfs_cor:CurrentLiabilities contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">30000000000000</jppfs_cor:CurrentLiabilities>
<jppfs_cor:CashAndDeposits contextRef="CurrentYearInstant" unitRef="JPY" decimals="-6">8982404000000</jppfs_cor:CashAndDeposits>
<jpcrp_cor:TotalNumberOfIssuedSharesSummaryOfBusinessResults contextRef="CurrentYearInstant_NonConsolidatedMember" unitRef="shares" decimals="0">15794987460</jpcrp_cor:TotalNumberOfIssuedSharesSummaryOfBusinessResults>
</xbrli:xbrl>"#;

const MOCK_AUDIT_XBRL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">
<jppfs_cor:OperatingIncome contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">1</jppfs_cor:OperatingIncome>
</xbrli:xbrl>"#;

const MOCK_INTERIM_XBRL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">
<jppfs_cor:NetSales contextRef="InterimDuration" unitRef="JPY" decimals="-6">6233400000000</jppfs_cor:NetSales>
<jppfs_cor:OrdinaryIncome contextRef="InterimDuration" unitRef="JPY" decimals="-6">781600000000</jppfs_cor:OrdinaryIncome>
<jppfs_cor:ProfitLossAttributableToOwnersOfParent contextRef="InterimDuration" unitRef="JPY" decimals="-6">578100000000</jppfs_cor:ProfitLossAttributableToOwnersOfParent>
<jppfs_cor:Assets contextRef="InterimInstant" unitRef="JPY" decimals="-6">35500000000000</jppfs_cor:Assets>
<jppfs_cor:NetAssets contextRef="InterimInstant_NonConsolidatedMember" unitRef="JPY" decimals="-6">8800000000000</jppfs_cor:NetAssets>
<jppfs_cor:CashAndDeposits contextRef="InterimInstant" unitRef="JPY" decimals="-6">1700000000000</jppfs_cor:CashAndDeposits>
<jpcrp_cor:NumberOfIssuedSharesAsOfFilingDateIssuedSharesTotalNumberOfSharesEtc contextRef="FilingDateInstant" unitRef="shares" decimals="0">6149810645</jpcrp_cor:NumberOfIssuedSharesAsOfFilingDateIssuedSharesTotalNumberOfSharesEtc>
</xbrli:xbrl>"#;

const MOCK_COVER_ONLY_XBRL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">
<jpdei_cor:SecurityCodeDEI contextRef="FilingDateInstant">83060</jpdei_cor:SecurityCodeDEI>
<jppfs_cor:OperatingIncome contextRef="CurrentYearDuration" unitRef="JPY" decimals="-6">2000000000000</jppfs_cor:OperatingIncome>
</xbrli:xbrl>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_archive;

    #[tokio::test]
    async fn fixed_mock_list_round_trips_through_models() {
        let source = MockSource::fixed().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();
        let filings = source.document_list(date).await.unwrap();
        assert_eq!(filings.len(), 5);
        assert_eq!(filings.iter().filter(|f| f.is_financial_statement()).count(), 4);
    }

    #[tokio::test]
    async fn fixed_archives_extract_as_expected() {
        let source = MockSource::fixed().unwrap();
        let filings = source
            .document_list(NaiveDate::from_ymd_opt(2025, 6, 18).unwrap())
            .await
            .unwrap();

        let annual = source.archive(&filings[0]).await.unwrap();
        let figures = extract_archive(&annual).unwrap();
        assert_eq!(figures.revenue, 48_036_704_000_000);
        // The audit report's value is never consulted.
        assert_eq!(figures.operating_income, 4_795_586_000_000);

        let interim = source.archive(&filings[1]).await.unwrap();
        let figures = extract_archive(&interim).unwrap();
        assert_eq!(figures.operating_income, 781_600_000_000);
        assert_eq!(figures.net_assets, 8_800_000_000_000);
        assert_eq!(figures.shares_issued, 6_149_810_645);

        let missing = source.archive(&filings[2]).await;
        assert!(matches!(missing, Err(EdinetError::Http(s)) if s == reqwest::StatusCode::NOT_FOUND));
    }
}
