// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdinetError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 401 bad key, 404 unknown document

    #[error("EDINET API reported status {status}: {message}")]
    Api { status: String, message: String }, // 200 response carrying an error body

    #[error("Failed to parse EDINET response: {0}")]
    Parse(String),

    #[error("Security code '{0}' is shorter than four alphanumeric characters")]
    InvalidSecCode(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Insufficient data: revenue, total assets and net assets are all missing")]
    InsufficientData,

    #[error("No XBRL document found in archive")]
    NoXbrlDocument,

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(e: zip::result::ZipError) -> Self {
        ExtractError::Archive(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file not found: {0}")]
    Missing(String),
}

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Malformed price CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("No price rows returned for {0}")]
    Empty(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDINET interaction failed: {0}")]
    Edinet(#[from] EdinetError), // Automatically convert EDINET errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Price fetch failed: {0}")]
    Price(#[from] PriceError),

    #[error("Server error: {0}")]
    Server(String),
}
