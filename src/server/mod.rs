// src/server/mod.rs
pub mod handlers;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::storage::Storage;
use crate::utils::{AppError, Config};

pub use handlers::AppState;

/// API routes plus the dashboard assets in `static_dir` as fallback.
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/download/db", get(handlers::download_db))
        .route("/api/stocks", get(handlers::list_stocks))
        .route("/api/prices/:code", get(handlers::price_history))
        .route("/api/screen", get(handlers::screen))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves until Ctrl-C. Creates and migrates the database first so every
/// request can open it read-only.
pub async fn serve(config: &Config, addr: &str, static_dir: &Path) -> Result<(), AppError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address '{}': {}", addr, e)))?;

    let db_path = config.db_path();
    let storage = Storage::open(&db_path)?;
    if let Some(path) = storage.path() {
        tracing::info!("Database ready at {}", path.display());
    }
    drop(storage);
    if !static_dir.exists() {
        tracing::warn!("Static directory {} not found; dashboard will 404", static_dir.display());
    }

    let app = router(Arc::new(AppState::new(db_path)), static_dir);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Dashboard: http://{}", addr);
    tracing::info!("Endpoints: /api/stocks /api/prices/:code /api/screen /download/db /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Server shutting down");
        })
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}
