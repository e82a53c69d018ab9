// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for collection and price passes.
pub const DEFAULT_FILTER: &str = "info";
/// Server default: tower_http request traces are emitted at debug level.
pub const SERVER_FILTER: &str = "info,tower_http=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn setup_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!("Logging setup complete (default filter: {})", default_filter);
}
