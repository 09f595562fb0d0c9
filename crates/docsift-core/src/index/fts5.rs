//! FTS5 virtual table setup and entry maintenance.
//!
//! The full-text table has no lifecycle of its own. Every entry is keyed by the
//! `rowid` equal to the owning document's `sequence_id`, and is only written from
//! inside a document mutation transaction (see `DocumentStore`).

use crate::config::StoreConfig;
use crate::Result;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Configuration for the FTS5 table.
#[derive(Debug, Clone)]
pub struct FtsConfig {
    /// Name of the FTS5 virtual table.
    pub table_name: String,
    /// Tokenizer configuration.
    pub tokenizer: String,
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self {
            table_name: StoreConfig::FTS_TABLE.to_string(),
            tokenizer: StoreConfig::FTS_TOKENIZER.to_string(),
        }
    }
}

/// Manager for FTS5 setup and entry mutations.
pub struct FtsManager<'a> {
    config: &'a FtsConfig,
}

impl<'a> FtsManager<'a> {
    pub fn new(config: &'a FtsConfig) -> Self {
        Self { config }
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Check if the FTS5 table exists.
    pub fn table_exists(&self, conn: &Connection) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&self.config.table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create the table if missing, backfilling it from existing documents.
    pub fn ensure_setup(&self, conn: &Connection) -> Result<()> {
        if !self.table_exists(conn)? {
            self.create_table(conn)?;
            self.populate_from_documents(conn)?;
        }
        Ok(())
    }

    /// Create the FTS5 virtual table.
    pub fn create_table(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(
                content,
                name,
                extension,
                tokenize='{}'
            )",
            self.config.table_name, self.config.tokenizer
        );

        conn.execute(&sql, [])?;
        info!("Created FTS5 table: {}", self.config.table_name);
        Ok(())
    }

    /// Add the entry for `sequence_id`.
    pub fn insert_entry(
        &self,
        conn: &Connection,
        sequence_id: i64,
        content: &str,
        name: &str,
        extension: &str,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (rowid, content, name, extension) VALUES (?1, ?2, ?3, ?4)",
            self.config.table_name
        );
        conn.execute(&sql, params![sequence_id, content, name, extension])?;
        Ok(())
    }

    /// Remove the entry for `sequence_id`. Returns the number of entries removed.
    pub fn delete_entry(&self, conn: &Connection, sequence_id: i64) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE rowid = ?1", self.config.table_name);
        Ok(conn.execute(&sql, params![sequence_id])?)
    }

    /// All correlation keys currently present in the index.
    pub fn keys(&self, conn: &Connection) -> Result<BTreeSet<i64>> {
        let sql = format!("SELECT rowid FROM {}", self.config.table_name);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut keys = BTreeSet::new();
        for row in rows {
            keys.insert(row?);
        }
        Ok(keys)
    }

    /// Replace the index contents with one entry per document row.
    pub fn populate_from_documents(&self, conn: &Connection) -> Result<()> {
        let table = &self.config.table_name;

        conn.execute_batch(&format!("DELETE FROM {};", table))?;

        let sql = format!(
            "INSERT INTO {} (rowid, content, name, extension)
             SELECT sequence_id, content, name, extension FROM {}",
            table,
            StoreConfig::DOCUMENTS_TABLE
        );
        let inserted = conn.execute(&sql, [])?;

        info!("Populated FTS5 table with {} documents", inserted);
        Ok(())
    }

    /// Drop and recreate the table, then repopulate it.
    pub fn rebuild(&self, conn: &Connection) -> Result<()> {
        let drop_sql = format!("DROP TABLE IF EXISTS {}", self.config.table_name);
        conn.execute(&drop_sql, [])?;

        self.create_table(conn)?;
        self.populate_from_documents(conn)?;

        info!("Rebuilt FTS5 index");
        Ok(())
    }

    /// Merge the index b-trees.
    pub fn optimize(&self, conn: &Connection) -> Result<()> {
        let sql = format!(
            "INSERT INTO {}({}) VALUES('optimize')",
            self.config.table_name, self.config.table_name
        );
        conn.execute(&sql, [])?;
        debug!("Optimized FTS5 index");
        Ok(())
    }

    /// Get statistics about the FTS5 index.
    pub fn get_stats(&self, conn: &Connection) -> Result<FtsStats> {
        let row_count: usize = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.config.table_name),
            [],
            |row| row.get(0),
        )?;

        Ok(FtsStats {
            table_name: self.config.table_name.clone(),
            row_count,
            tokenizer: self.config.tokenizer.clone(),
        })
    }
}

/// Statistics about an FTS5 index.
#[derive(Debug, Clone)]
pub struct FtsStats {
    pub table_name: String,
    pub row_count: usize,
    pub tokenizer: String,
}
