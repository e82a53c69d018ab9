// src/server/handlers.rs
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::query::{self, ScreenEntry, StockView};
use crate::storage::{PricePoint, Storage};
use crate::utils::error::StorageError;

/// Shared state for every handler. Connections are opened per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db_path: PathBuf,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: msg.into() }))
}

fn storage_error(e: StorageError) -> ApiError {
    match e {
        StorageError::Missing(path) => {
            tracing::warn!("Database file missing: {}", path);
            error_response(StatusCode::NOT_FOUND, "no data collected yet")
        }
        other => {
            tracing::error!("Storage query failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

/// Runs a read against a fresh connection on the blocking pool.
async fn with_storage<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Storage) -> Result<T, StorageError> + Send + 'static,
{
    let path = state.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let storage = Storage::open_existing(&path)?;
        f(&storage)
    })
    .await
    .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(storage_error)
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/// GET /api/stocks
pub async fn list_stocks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StockView>>, ApiError> {
    let stocks = with_storage(&state, |s| query::stock_listing(s)).await?;
    tracing::debug!("Serving {} stocks", stocks.len());
    Ok(Json(stocks))
}

/// GET /api/prices/:code, oldest first.
pub async fn price_history(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(error_response(StatusCode::BAD_REQUEST, format!("invalid code '{}'", code)));
    }
    let history = with_storage(&state, move |s| s.price_history(&code)).await?;
    Ok(Json(history))
}

/// GET /api/screen
pub async fn screen(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ScreenEntry>>, ApiError> {
    Ok(Json(with_storage(&state, |s| query::screen(s)).await?))
}

/// GET /download/db, the raw SQLite file.
pub async fn download_db(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let bytes = match tokio::fs::read(&state.db_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(error_response(StatusCode::NOT_FOUND, "no data collected yet"));
        }
        Err(e) => {
            tracing::error!("Failed to read {}: {}", state.db_path.display(), e);
            return Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let file_name = state
        .db_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::utils::config::DB_FILE_NAME.to_string());
    let disposition = format!("attachment; filename=\"{}\"", file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
