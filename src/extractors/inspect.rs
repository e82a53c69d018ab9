// src/extractors/inspect.rs
//! Diagnostics for tuning the tag table against real filings: which entries an
//! archive holds, which `contextRef` values each instance uses, which share
//! count tags it carries, and which pattern resolved every field.
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::archive::{read_entries, EntryKind};
use crate::extractors::patterns::Variant;
use crate::extractors::xbrl::{FiguresAccumulator, FinancialFigures, Resolution};
use crate::utils::error::ExtractError;

static CONTEXT_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bcontextRef="([^"]+)""#).expect("Failed to compile CONTEXT_REF_RE")
});

static SHARE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(?:[\w\-]+:)?(\w*IssuedShares\w*)\s[^>]*?\bcontextRef="([^"]+)"[^>]*>([^<]*)</"#)
        .expect("Failed to compile SHARE_TAG_RE")
});

/// A share-count element as written in the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTag {
    pub tag: String,
    pub context: String,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct EntryReport {
    pub name: String,
    pub kind: EntryKind,
    pub context_refs: BTreeSet<String>,
    pub share_tags: Vec<ShareTag>,
}

#[derive(Debug)]
pub struct InspectReport {
    pub entries: Vec<EntryReport>,
    pub resolutions: Vec<Resolution>,
    pub figures: Result<FinancialFigures, ExtractError>,
}

/// Distinct `contextRef` values in one instance.
pub fn context_refs(text: &str) -> BTreeSet<String> {
    CONTEXT_REF_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Every element whose name mentions issued shares, in document order.
pub fn share_tags(text: &str) -> Vec<ShareTag> {
    SHARE_TAG_RE
        .captures_iter(text)
        .map(|caps| ShareTag {
            tag: caps[1].to_string(),
            context: caps[2].to_string(),
            raw: caps[3].trim().to_string(),
        })
        .collect()
}

fn instance_report(name: &str, text: &str) -> EntryReport {
    EntryReport {
        name: name.to_string(),
        kind: EntryKind::Instance,
        context_refs: context_refs(text),
        share_tags: share_tags(text),
    }
}

/// Runs extraction over one document and records how it went.
pub fn inspect_document(name: &str, text: &str) -> InspectReport {
    let mut acc = FiguresAccumulator::new();
    acc.absorb(text);
    let resolutions = acc.resolutions().to_vec();
    InspectReport {
        entries: vec![instance_report(name, text)],
        resolutions,
        figures: acc.finish(),
    }
}

/// Runs extraction over an archive and records how it went.
pub fn inspect_archive(bytes: &[u8]) -> Result<InspectReport, ExtractError> {
    let mut acc = FiguresAccumulator::new();
    let mut entries = Vec::new();

    for entry in read_entries(bytes)? {
        let report = match &entry.text {
            Some(text) => {
                acc.absorb(text);
                instance_report(&entry.name, text)
            }
            None => EntryReport {
                name: entry.name,
                kind: entry.kind,
                context_refs: BTreeSet::new(),
                share_tags: Vec::new(),
            },
        };
        entries.push(report);
    }

    let resolutions = acc.resolutions().to_vec();
    let figures = if acc.documents() == 0 { Err(ExtractError::NoXbrlDocument) } else { acc.finish() };
    Ok(InspectReport { entries, resolutions, figures })
}

impl InspectReport {
    /// Writes the report to the log.
    pub fn log(&self) {
        for entry in &self.entries {
            match entry.kind {
                EntryKind::AuditReport => tracing::info!("[skip] {} (audit report)", entry.name),
                EntryKind::Other => tracing::debug!("[skip] {}", entry.name),
                EntryKind::Instance => {
                    tracing::info!("[instance] {} ({} contexts)", entry.name, entry.context_refs.len());
                    for context in &entry.context_refs {
                        tracing::info!("    context {}", context);
                    }
                    for share in &entry.share_tags {
                        tracing::info!("    shares {} [{}] = {}", share.tag, share.context, share.raw);
                    }
                }
            }
        }

        for r in &self.resolutions {
            let variant = match r.variant {
                Variant::Primary => "primary".to_string(),
                Variant::Fallback(level) => format!("fallback {}", level),
            };
            let document = self.instance_name(r.document).unwrap_or("?");
            tracing::info!("{} = {} via {} ({}) in {}", r.field.name(), r.value, r.tag, variant, document);
        }

        match &self.figures {
            Ok(_) => tracing::info!("Extraction succeeded"),
            Err(e) => tracing::warn!("Extraction failed: {}", e),
        }
    }

    /// Name of the n-th absorbed instance.
    fn instance_name(&self, index: usize) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Instance)
            .nth(index)
            .map(|e| e.name.as_str())
    }
}
