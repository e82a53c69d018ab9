// src/extractors/mod.rs
pub mod archive;
pub mod inspect;
pub mod patterns;
pub mod xbrl;

use std::path::Path;

use crate::utils::error::ExtractError;

// Re-export key extraction types for convenience
pub use archive::extract_archive;
pub use inspect::InspectReport;
pub use xbrl::{extract_document, FinancialFigures};

/// `.zip` files are whole EDINET archives; anything else is read as one instance.
fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn read_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts figures from a local instance document or archive.
pub fn extract_file(path: &Path) -> Result<FinancialFigures, ExtractError> {
    if is_archive_path(path) {
        extract_archive(&std::fs::read(path)?)
    } else {
        extract_document(&read_text(path)?)
    }
}

/// Diagnostic counterpart of [`extract_file`].
pub fn inspect_file(path: &Path) -> Result<InspectReport, ExtractError> {
    if is_archive_path(path) {
        inspect::inspect_archive(&std::fs::read(path)?)
    } else {
        let name = path.display().to_string();
        Ok(inspect::inspect_document(&name, &read_text(path)?))
    }
}
