// src/storage/mod.rs
pub mod figures;
pub mod migrations;
pub mod prices;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::utils::error::StorageError;

pub use figures::CompanyRecord;
pub use prices::PricePoint;

/// One SQLite file holding figures, prices and the score cache.
pub struct Storage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Storage {
    /// Opens (creating if needed) the database file and applies pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        migrations::run_migrations(&conn)?;
        tracing::debug!("Opened storage at {}", path.display());
        Ok(Self { conn, path: Some(path) })
    }

    /// Opens an existing, already migrated file without touching its schema.
    /// Used per request by the server.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StorageError::Missing(path.display().to_string()));
        }
        let conn = Connection::open(&path)?;
        Ok(Self { conn, path: Some(path) })
    }

    /// In-memory database with the full schema; data is lost on drop.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Zero means "not found" in extracted figures; store it as NULL.
pub(crate) fn nullable(v: i64) -> Option<i64> {
    (v > 0).then_some(v)
}
