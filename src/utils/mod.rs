// src/utils/mod.rs
pub mod config;
pub mod error;
pub mod logging;
#[cfg(test)]
pub mod test_http;

pub use config::Config;
pub use error::AppError; // Re-export main error type for convenience
