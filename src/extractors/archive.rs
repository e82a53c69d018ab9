// src/extractors/archive.rs
use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::extractors::xbrl::{FiguresAccumulator, FinancialFigures};
use crate::utils::error::ExtractError;

const XBRL_SUFFIX: &str = ".xbrl";
/// EDINET names independent-auditor report instances with the `jpaud` taxonomy prefix.
const AUDIT_REPORT_MARKER: &str = "jpaud";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Financial XBRL instance.
    Instance,
    /// Auditor's report instance, never parsed for figures.
    AuditReport,
    /// HTML, schemas, linkbases, manifests.
    Other,
}

pub fn classify(name: &str) -> EntryKind {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    if !file_name.to_ascii_lowercase().ends_with(XBRL_SUFFIX) {
        EntryKind::Other
    } else if file_name.contains(AUDIT_REPORT_MARKER) {
        EntryKind::AuditReport
    } else {
        EntryKind::Instance
    }
}

/// One file entry of an archive. `text` is only read for financial instances.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub kind: EntryKind,
    pub text: Option<String>,
}

/// Lists the file entries of an archive in archive order.
///
/// Only an unreadable archive is an error. An entry whose header or body
/// can't be read is logged and left out.
pub fn read_entries(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable archive entry #{}: {}", i, e);
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let kind = classify(&name);
        let text = if kind == EntryKind::Instance {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut buf) {
                tracing::warn!("Skipping unreadable archive entry {}: {}", name, e);
                continue;
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        } else {
            None
        };
        entries.push(ArchiveEntry { name, kind, text });
    }

    Ok(entries)
}

/// Extracts figures from a downloaded EDINET archive.
///
/// Every XBRL instance except audit reports is absorbed in archive order, so
/// the main report and any amendment inside the same archive are merged under
/// the first-resolution-wins rule.
pub fn extract_archive(bytes: &[u8]) -> Result<FinancialFigures, ExtractError> {
    let mut acc = FiguresAccumulator::new();

    for entry in read_entries(bytes)? {
        match (entry.kind, entry.text) {
            (EntryKind::Instance, Some(text)) => {
                let resolved = acc.absorb(&text);
                tracing::debug!("Parsed {} ({} bytes, {} new fields)", entry.name, text.len(), resolved);
            }
            (EntryKind::AuditReport, _) => tracing::debug!("Skipping audit report {}", entry.name),
            _ => {}
        }
    }

    if acc.documents() == 0 {
        return Err(ExtractError::NoXbrlDocument);
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edinet::mock::build_zip;

    const MAIN: &str = r#"<xbrli:xbrl>
<jpcrp_cor:NetSalesSummaryOfBusinessResults contextRef="CurrentYearDuration" unitRef="JPY">5000</jpcrp_cor:NetSalesSummaryOfBusinessResults>
<jppfs_cor:NetAssets contextRef="CurrentYearInstant" unitRef="JPY">2000</jppfs_cor:NetAssets>
</xbrli:xbrl>"#;

    const AUDIT: &str = r#"<jppfs_cor:NetSales contextRef="CurrentYearDuration" unitRef="JPY">1</jppfs_cor:NetSales>
<jppfs_cor:OperatingIncome contextRef="CurrentYearDuration" unitRef="JPY">77</jppfs_cor:OperatingIncome>"#;

    const SUPPLEMENT: &str = r#"<jpcrp_cor:TotalNumberOfIssuedSharesSummaryOfBusinessResults contextRef="CurrentYearInstant_NonConsolidatedMember" unitRef="shares">300</jpcrp_cor:TotalNumberOfIssuedSharesSummaryOfBusinessResults>"#;

    #[test]
    fn audit_reports_and_non_xbrl_entries_are_skipped() {
        let instance = |name| classify(name) == EntryKind::Instance;
        assert!(instance("XBRL/PublicDoc/jpcrp030000-asr-001_E02144-000_2025-03-31_01_2025-06-18.xbrl"));
        assert!(!instance("XBRL/AuditDoc/jpaud-aar-cn-001_E02144-000_2025-03-31_01_2025-06-18.xbrl"));
        assert!(!instance("XBRL/PublicDoc/0101010_honbun.htm"));
        assert!(!instance("XBRL/PublicDoc/jpcrp030000-asr-001_lab.xml"));
    }

    #[test]
    fn merges_all_non_audit_instances() {
        let zip = build_zip(&[
            ("XBRL/AuditDoc/jpaud-aar-cn-001.xbrl", AUDIT),
            ("XBRL/PublicDoc/jpcrp030000-asr-001.xbrl", MAIN),
            ("XBRL/PublicDoc/0000000_header.htm", "<html/>"),
            ("XBRL/PublicDoc/jpcrp030000-asr-002.xbrl", SUPPLEMENT),
        ]).unwrap();
        let figures = extract_archive(&zip).unwrap();
        assert_eq!(figures.revenue, 5000);
        assert_eq!(figures.net_assets, 2000);
        assert_eq!(figures.shares_issued, 300);
        // Only present in the audit report.
        assert_eq!(figures.operating_income, 0);
    }

    #[test]
    fn archive_without_instances_is_reported() {
        let zip = build_zip(&[("XBRL/PublicDoc/0101010_honbun.htm", "<html/>")]).unwrap();
        assert!(matches!(extract_archive(&zip), Err(ExtractError::NoXbrlDocument)));
    }

    #[test]
    fn corrupt_archive_is_an_archive_error() {
        assert!(matches!(extract_archive(b"not a zip"), Err(ExtractError::Archive(_))));
    }

    #[test]
    fn empty_instance_is_insufficient() {
        let zip = build_zip(&[("XBRL/PublicDoc/jpcrp040300-q1r-001.xbrl", "<xbrli:xbrl/>")]).unwrap();
        assert!(matches!(extract_archive(&zip), Err(ExtractError::InsufficientData)));
    }

    #[test]
    fn entries_are_classified() {
        assert_eq!(classify("XBRL/PublicDoc/jpcrp030000-asr-001.xbrl"), EntryKind::Instance);
        assert_eq!(classify("XBRL/AuditDoc/jpaud-aar-cn-001.xbrl"), EntryKind::AuditReport);
        assert_eq!(classify("XBRL/PublicDoc/jpcrp030000-asr-001.xsd"), EntryKind::Other);
    }

    #[test]
    fn corrupt_entry_header_skips_only_that_entry() {
        let mut zip = build_zip(&[
            ("XBRL/PublicDoc/jpcrp030000-asr-001.xbrl", MAIN),
            ("XBRL/PublicDoc/jpcrp030000-asr-002.xbrl", SUPPLEMENT),
        ])
        .unwrap();
        // Break the local file header of the second entry; the central directory stays intact.
        let second = zip
            .windows(4)
            .enumerate()
            .filter(|(_, w)| *w == b"PK\x03\x04")
            .map(|(i, _)| i)
            .nth(1)
            .unwrap();
        zip[second..second + 4].copy_from_slice(b"XXXX");

        let figures = extract_archive(&zip).unwrap();
        assert_eq!(figures.revenue, 5000);
        assert_eq!(figures.shares_issued, 0);
    }
}
