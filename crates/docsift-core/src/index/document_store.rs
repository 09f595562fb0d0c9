//! SQLite document store with a synchronized FTS5 index.
//!
//! Every mutation of the `documents` table applies the matching full-text
//! mutation inside the same transaction. Either both land or neither does.

use crate::error::{DocSiftError, Result};
use crate::models::{Document, DocumentUpdate, NewDocument, SearchResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::fts5::{FtsConfig, FtsManager, FtsStats};
use super::query::QueryExpression;
use super::schema;

const DOCUMENT_COLUMNS: &str = "sequence_id, id, name, extension, directory, content";

/// Orphaned keys found by `DocumentStore::check_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub document_count: usize,
    pub index_entry_count: usize,
    /// Documents with no full-text entry.
    pub missing_entries: Vec<i64>,
    /// Full-text entries with no document.
    pub orphan_entries: Vec<i64>,
}

impl SyncReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_entries.is_empty() && self.orphan_entries.is_empty()
    }
}

/// Document store backed by SQLite with FTS5 search.
///
/// The connection sits behind a mutex, so writers are serialized by the store.
pub struct DocumentStore {
    db_path: Option<PathBuf>,
    conn: Mutex<Connection>,
    fts_config: FtsConfig,
}

impl DocumentStore {
    /// Create or open a store at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(db_path, FtsConfig::default())
    }

    /// Create or open a store with a custom full-text configuration.
    pub fn open_with_config(db_path: impl Into<PathBuf>, fts_config: FtsConfig) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| DocSiftError::Io {
                    message: format!("Failed to create directory {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(&db_path)?;
        schema::configure_connection(&conn, true)?;

        let store = Self::init(conn, Some(db_path), fts_config)?;
        info!("Opened document store at {:?}", store.db_path);
        Ok(store)
    }

    /// Create a store that lives only as long as the returned value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::configure_connection(&conn, false)?;
        Self::init(conn, None, FtsConfig::default())
    }

    fn init(conn: Connection, db_path: Option<PathBuf>, fts_config: FtsConfig) -> Result<Self> {
        schema::create_tables(&conn)?;
        FtsManager::new(&fts_config).ensure_setup(&conn)?;

        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
            fts_config,
        })
    }

    /// Get the database path, `None` for in-memory stores.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DocSiftError::Storage {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    fn fts(&self) -> FtsManager<'_> {
        FtsManager::new(&self.fts_config)
    }

    // ========================================
    // Mutations
    // ========================================

    /// Store a new document and its full-text entry. Returns the assigned sequence id.
    ///
    /// Duplicate `id` values are accepted; callers de-duplicate if they need to.
    pub fn insert(&self, document: &NewDocument) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO documents (id, name, extension, directory, content)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                document.id,
                document.name,
                document.extension,
                document.directory,
                document.content,
            ],
        )?;
        let sequence_id = tx.last_insert_rowid();

        self.fts().insert_entry(
            &tx,
            sequence_id,
            &document.content,
            &document.name,
            &document.extension,
        )?;

        tx.commit()?;

        debug!("Inserted document {} as #{}", document.id, sequence_id);
        Ok(sequence_id)
    }

    /// Replace the searchable fields of a document.
    ///
    /// The old full-text entry is removed before the new one is written.
    /// Returns `false` when no document has this sequence id.
    pub fn update(&self, sequence_id: i64, update: &DocumentUpdate) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM documents WHERE sequence_id = ?1",
                params![sequence_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(false);
        }

        let fts = self.fts();
        fts.delete_entry(&tx, sequence_id)?;

        tx.execute(
            "UPDATE documents SET name = ?1, extension = ?2, content = ?3
             WHERE sequence_id = ?4",
            params![update.name, update.extension, update.content, sequence_id],
        )?;

        fts.insert_entry(
            &tx,
            sequence_id,
            &update.content,
            &update.name,
            &update.extension,
        )?;

        tx.commit()?;

        debug!("Updated document #{}", sequence_id);
        Ok(true)
    }

    /// Remove a document and its full-text entry.
    ///
    /// Returns `false` when no document has this sequence id.
    pub fn delete(&self, sequence_id: i64) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let rows_affected = tx.execute(
            "DELETE FROM documents WHERE sequence_id = ?1",
            params![sequence_id],
        )?;
        if rows_affected == 0 {
            return Ok(false);
        }

        self.fts().delete_entry(&tx, sequence_id)?;
        tx.commit()?;

        debug!("Deleted document #{}", sequence_id);
        Ok(true)
    }

    /// Remove every document and every full-text entry.
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM documents", [])?;
        tx.execute_batch(&format!("DELETE FROM {};", self.fts_config.table_name))?;
        tx.commit()?;

        debug!("Cleared document store");
        Ok(())
    }

    // ========================================
    // Lookups
    // ========================================

    /// Get the document with this external id.
    ///
    /// When the id was ingested more than once, the earliest row wins.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.lock()?;

        let sql = format!(
            "SELECT {} FROM documents WHERE id = ?1 ORDER BY sequence_id LIMIT 1",
            DOCUMENT_COLUMNS
        );
        let result = conn
            .query_row(&sql, params![id], Self::row_to_document)
            .optional()?;

        Ok(result)
    }

    /// Get the document with this sequence id.
    pub fn get_by_sequence_id(&self, sequence_id: i64) -> Result<Option<Document>> {
        let conn = self.lock()?;

        let sql = format!(
            "SELECT {} FROM documents WHERE sequence_id = ?1",
            DOCUMENT_COLUMNS
        );
        let result = conn
            .query_row(&sql, params![sequence_id], Self::row_to_document)
            .optional()?;

        Ok(result)
    }

    /// Get the count of documents.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: usize =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All sequence ids currently in the document table.
    pub fn sequence_ids(&self) -> Result<BTreeSet<i64>> {
        let conn = self.lock()?;
        Self::document_keys(&conn)
    }

    /// All correlation keys currently in the full-text index.
    pub fn index_keys(&self) -> Result<BTreeSet<i64>> {
        let conn = self.lock()?;
        self.fts().keys(&conn)
    }

    fn document_keys(conn: &Connection) -> Result<BTreeSet<i64>> {
        let mut stmt = conn.prepare("SELECT sequence_id FROM documents")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut keys = BTreeSet::new();
        for row in rows {
            keys.insert(row?);
        }
        Ok(keys)
    }

    fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
        Ok(Document {
            sequence_id: row.get(0)?,
            id: row.get(1)?,
            name: row.get(2)?,
            extension: row.get(3)?,
            directory: row.get(4)?,
            content: row.get(5)?,
        })
    }

    // ========================================
    // Search
    // ========================================

    /// Run a built query.
    ///
    /// Results come back in ascending sequence id order, which is insertion order.
    pub fn search(&self, query: &QueryExpression) -> Result<Vec<SearchResult>> {
        self.search_raw(&query.to_match_string())
    }

    /// Run an already-built FTS5 MATCH string such as `content:log AND name:api*`.
    ///
    /// A blank string is rejected, as is a string SQLite cannot parse.
    pub fn search_raw(&self, match_query: &str) -> Result<Vec<SearchResult>> {
        if match_query.trim().is_empty() {
            return Err(DocSiftError::invalid_argument(
                "search query must not be empty",
            ));
        }

        let conn = self.lock()?;
        let table = &self.fts_config.table_name;
        let sql = format!(
            "SELECT d.id, d.name, d.directory, d.extension
             FROM {table}
             JOIN documents AS d ON d.sequence_id = {table}.rowid
             WHERE {table} MATCH ?1
             ORDER BY {table}.rowid",
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![match_query], |row| {
                Ok(SearchResult {
                    id: row.get(0)?,
                    file_name: row.get(1)?,
                    directory: row.get(2)?,
                    extension: row.get(3)?,
                })
            })
            .map_err(|e| map_match_error(e, match_query))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| map_match_error(e, match_query))?);
        }

        debug!("Query {:?} matched {} documents", match_query, results.len());
        Ok(results)
    }

    // ========================================
    // Maintenance
    // ========================================

    /// Compare both key sets and report orphans on either side.
    pub fn check_consistency(&self) -> Result<SyncReport> {
        let conn = self.lock()?;
        let documents = Self::document_keys(&conn)?;
        let entries = self.fts().keys(&conn)?;

        Ok(SyncReport {
            document_count: documents.len(),
            index_entry_count: entries.len(),
            missing_entries: documents.difference(&entries).copied().collect(),
            orphan_entries: entries.difference(&documents).copied().collect(),
        })
    }

    /// Rebuild the full-text index from the document table.
    pub fn rebuild_index(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        self.fts().rebuild(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Optimize the FTS5 index.
    pub fn optimize_index(&self) -> Result<()> {
        let conn = self.lock()?;
        self.fts().optimize(&conn)
    }

    pub fn index_stats(&self) -> Result<FtsStats> {
        let conn = self.lock()?;
        self.fts().get_stats(&conn)
    }

    /// Checkpoint the WAL file.
    pub fn checkpoint_wal(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        debug!("Checkpointed WAL");
        Ok(())
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().map_err(|_| DocSiftError::Storage {
            message: "Connection lock poisoned".to_string(),
            source: None,
        })?;
        conn.close().map_err(|(_, e)| DocSiftError::from(e))?;
        info!("Closed document store");
        Ok(())
    }
}

/// Turn FTS5 parse failures into caller errors; everything else stays a storage error.
fn map_match_error(err: rusqlite::Error, match_query: &str) -> DocSiftError {
    if let rusqlite::Error::SqliteFailure(_, Some(message)) = &err {
        let malformed = message.starts_with("fts5:")
            || message.starts_with("no such column")
            || message.contains("unterminated string")
            || message.contains("syntax error");
        if malformed {
            return DocSiftError::invalid_argument(format!(
                "malformed query {:?}: {}",
                match_query, message
            ));
        }
    }
    DocSiftError::from(err)
}
