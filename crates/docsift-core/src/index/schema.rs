//! Base schema and connection settings.
//!
//! The full-text table is created separately by `FtsManager` since its shape
//! depends on `FtsConfig`.

use crate::config::StoreConfig;
use crate::Result;
use rusqlite::Connection;

/// Configure connection with the settings the store relies on.
///
/// WAL is not available for in-memory databases, so it is only requested for
/// file-backed connections.
pub fn configure_connection(conn: &Connection, file_backed: bool) -> Result<()> {
    if file_backed {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    }
    conn.busy_timeout(StoreConfig::BUSY_TIMEOUT)?;
    conn.execute_batch(
        "
        PRAGMA synchronous=NORMAL;
        PRAGMA temp_store=MEMORY;
        ",
    )?;
    Ok(())
}

/// Create the document table and the side tables if they don't exist.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Indexed documents. `id` is intentionally not unique.
        CREATE TABLE IF NOT EXISTS documents (
            sequence_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            extension TEXT NOT NULL,
            directory TEXT NOT NULL,
            content TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_id ON documents(id);

        -- One row per scanned root
        CREATE TABLE IF NOT EXISTS scan_runs (
            path TEXT PRIMARY KEY,
            discovered_count INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            error_count INTEGER NOT NULL DEFAULT 0,
            index_size INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            status TEXT NOT NULL
        );

        -- Runtime settings
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Favorites, distinct by document id
        CREATE TABLE IF NOT EXISTS favorites (
            rid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            extension TEXT NOT NULL,
            directory TEXT NOT NULL,
            content TEXT NOT NULL
        );

        -- Every file seen by a scan
        CREATE TABLE IF NOT EXISTS discovered_files (
            name TEXT NOT NULL,
            directory TEXT NOT NULL
        );

        -- Files indexed successfully, with analytics columns
        CREATE TABLE IF NOT EXISTS indexed_files (
            internal_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            content TEXT,
            size INTEGER,
            extension TEXT,
            modified_at INTEGER,
            md5 TEXT,
            duplicate INTEGER,
            content_status INTEGER,
            tags TEXT,
            created_at INTEGER,
            status INTEGER,
            directory TEXT,
            frequency INTEGER
        );

        -- Files skipped during ingestion
        CREATE TABLE IF NOT EXISTS scan_errors (
            directory TEXT NOT NULL,
            name TEXT NOT NULL,
            message TEXT NOT NULL,
            category TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
