// src/storage/migrations.rs
use rusqlite::Connection;

use crate::utils::error::StorageError;

enum Step {
    Sql(&'static str),
    /// Additive columns. Columns that already exist are left alone, so files
    /// written before migrations were tracked still upgrade cleanly.
    AddColumns {
        table: &'static str,
        columns: &'static [(&'static str, &'static str)],
    },
}

const MIGRATIONS: &[(&str, Step)] = &[
    ("001_stocks", Step::Sql(CREATE_STOCKS_TABLE)),
    (
        "002_stock_figures",
        Step::AddColumns {
            table: "stocks",
            columns: &[
                // Revenue; named after the first figure ever collected.
                ("net_sales", "INTEGER"),
                ("operating_income", "INTEGER"),
                ("net_income", "INTEGER"),
                ("total_assets", "INTEGER"),
                ("net_assets", "INTEGER"),
                ("current_assets", "INTEGER"),
                ("liabilities", "INTEGER"),
                ("current_liabilities", "INTEGER"),
                ("cash_and_deposits", "INTEGER"),
                ("shares_issued", "INTEGER"),
            ],
        },
    ),
    (
        "003_stock_source",
        Step::AddColumns {
            table: "stocks",
            columns: &[("doc_id", "TEXT"), ("doc_type", "TEXT"), ("submitted_at", "TEXT")],
        },
    ),
    ("004_prices", Step::Sql(CREATE_PRICES_TABLE)),
    ("005_scores", Step::Sql(CREATE_SCORES_TABLE)),
];

/// Run all pending migrations. Safe to call on every open.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    for (name, step) in MIGRATIONS {
        run_migration(conn, name, step)?;
    }

    tracing::debug!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, step: &Step) -> Result<(), StorageError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(());
    }

    tracing::info!("Running migration: {}", name);
    let tx = conn.unchecked_transaction()?;
    match step {
        Step::Sql(sql) => tx.execute_batch(sql)?,
        Step::AddColumns { table, columns } => {
            let existing = column_names(&tx, table)?;
            for (column, ty) in *columns {
                if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                    tracing::debug!("Column {}.{} already exists", table, column);
                    continue;
                }
                tx.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ty))?;
            }
        }
    }
    tx.execute("INSERT INTO schema_migrations (name) VALUES (?1)", [name])?;
    tx.commit()?;
    Ok(())
}

fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
fn table_exists(conn: &Connection, table: &str) -> Result<bool, StorageError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )?)
}

const CREATE_STOCKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stocks (
    code TEXT PRIMARY KEY,
    name TEXT,
    updated_at DATETIME
);
"#;

const CREATE_PRICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS prices (
    code TEXT NOT NULL,
    date TEXT NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume INTEGER NOT NULL,
    PRIMARY KEY (code, date)
);
CREATE INDEX IF NOT EXISTS idx_prices_code_date ON prices(code, date);
"#;

const CREATE_SCORES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS scores (
    code TEXT NOT NULL,
    date TEXT NOT NULL,
    score INTEGER NOT NULL,
    PRIMARY KEY (code, date)
);
"#;
