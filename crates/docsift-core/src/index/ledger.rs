//! Side tables: scan runs, settings, favorites and the scan error ledger.
//!
//! None of these take part in the document/index synchronization.

use crate::config::{IngestConfig, SettingKeys};
use crate::error::{DocSiftError, Result};
use crate::models::SearchResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::document_store::DocumentStore;

/// State of the last scan recorded for a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRunStatus {
    Running,
    Completed,
    Failed,
}

impl ScanRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanRunStatus::Running => "running",
            ScanRunStatus::Completed => "completed",
            ScanRunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(ScanRunStatus::Running),
            "completed" => Some(ScanRunStatus::Completed),
            "failed" => Some(ScanRunStatus::Failed),
            _ => None,
        }
    }
}

/// Summary of the most recent scan of one root path.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRunRecord {
    pub path: String,
    pub discovered_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub index_size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ScanRunStatus,
}

/// A file skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanErrorRecord {
    pub directory: String,
    pub name: String,
    pub message: String,
    pub category: String,
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl DocumentStore {
    // ========================================
    // Scan runs
    // ========================================

    /// Insert or update the run summary for `record.path`.
    ///
    /// `created_at` of an existing row is preserved.
    pub fn record_scan_run(&self, record: &ScanRunRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scan_runs (path, discovered_count, success_count, error_count,
                                    index_size, created_at, updated_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(path) DO UPDATE SET
                 discovered_count=excluded.discovered_count,
                 success_count=excluded.success_count,
                 error_count=excluded.error_count,
                 index_size=excluded.index_size,
                 updated_at=excluded.updated_at,
                 status=excluded.status",
            params![
                record.path,
                record.discovered_count as i64,
                record.success_count as i64,
                record.error_count as i64,
                record.index_size as i64,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
                record.status.as_str(),
            ],
        )?;
        debug!("Recorded scan run for {}", record.path);
        Ok(())
    }

    pub fn get_scan_run(&self, path: &str) -> Result<Option<ScanRunRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT path, discovered_count, success_count, error_count, index_size,
                        created_at, updated_at, status
                 FROM scan_runs WHERE path = ?1",
                params![path],
                row_to_scan_run,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_scan_runs(&self) -> Result<Vec<ScanRunRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT path, discovered_count, success_count, error_count, index_size,
                    created_at, updated_at, status
             FROM scan_runs ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_scan_run)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    // ========================================
    // Settings
    // ========================================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Extensions to index, `["txt"]` until something else is saved.
    pub fn selected_extensions(&self) -> Result<Vec<String>> {
        let extensions = match self.get_setting(SettingKeys::EXTENSIONS)? {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect(),
            None => IngestConfig::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        };
        Ok(extensions)
    }

    /// Save the extension list. An empty list means "index everything".
    pub fn set_selected_extensions(&self, extensions: &[String]) -> Result<()> {
        if extensions.iter().any(|e| e.contains(',')) {
            return Err(DocSiftError::Config {
                message: "extensions must not contain ','".to_string(),
            });
        }
        self.set_setting(SettingKeys::EXTENSIONS, &extensions.join(","))
    }

    pub fn last_directory(&self) -> Result<Option<String>> {
        self.get_setting(SettingKeys::LAST_DIRECTORY)
    }

    pub fn set_last_directory(&self, directory: &str) -> Result<()> {
        self.set_setting(SettingKeys::LAST_DIRECTORY, directory)
    }

    // ========================================
    // Favorites
    // ========================================

    /// Copy the document with this id into the favorites set.
    ///
    /// Adding a favorite twice keeps a single row.
    pub fn add_favorite(&self, id: &str) -> Result<()> {
        let document = self.get_by_id(id)?.ok_or_else(|| DocSiftError::NotFound {
            key: id.to_string(),
        })?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO favorites (id, name, extension, directory, content)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                document.id,
                document.name,
                document.extension,
                document.directory,
                document.content,
            ],
        )?;
        Ok(())
    }

    pub fn remove_favorite(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let rows_affected = conn.execute("DELETE FROM favorites WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    pub fn list_favorites(&self) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, name, directory, extension FROM favorites ORDER BY rid")?;
        let rows = stmt.query_map([], |row| {
            Ok(SearchResult {
                id: row.get(0)?,
                file_name: row.get(1)?,
                directory: row.get(2)?,
                extension: row.get(3)?,
            })
        })?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }
        Ok(favorites)
    }

    // ========================================
    // Scan errors
    // ========================================

    pub fn record_scan_error(
        &self,
        directory: &str,
        name: &str,
        message: &str,
        category: &str,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scan_errors (directory, name, message, category)
             VALUES (?1, ?2, ?3, ?4)",
            params![directory, name, message, category],
        )?;
        Ok(())
    }

    pub fn list_scan_errors(&self) -> Result<Vec<ScanErrorRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT directory, name, message, category FROM scan_errors ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ScanErrorRecord {
                directory: row.get(0)?,
                name: row.get(1)?,
                message: row.get(2)?,
                category: row.get(3)?,
            })
        })?;

        let mut errors = Vec::new();
        for row in rows {
            errors.push(row?);
        }
        Ok(errors)
    }

    pub fn clear_scan_errors(&self) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM scan_errors", [])?)
    }
}

fn row_to_scan_run(row: &Row) -> rusqlite::Result<ScanRunRecord> {
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    let status: String = row.get(7)?;

    Ok(ScanRunRecord {
        path: row.get(0)?,
        discovered_count: row.get::<_, i64>(1)? as usize,
        success_count: row.get::<_, i64>(2)? as usize,
        error_count: row.get::<_, i64>(3)? as usize,
        index_size: row.get::<_, i64>(4)? as u64,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
        status: ScanRunStatus::parse(&status).unwrap_or(ScanRunStatus::Failed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDocument;
    use chrono::Duration;

    fn create_test_store() -> DocumentStore {
        DocumentStore::open_in_memory().unwrap()
    }

    fn run_record(path: &str, created_at: DateTime<Utc>) -> ScanRunRecord {
        ScanRunRecord {
            path: path.to_string(),
            discovered_count: 3,
            success_count: 2,
            error_count: 1,
            index_size: 2048,
            created_at,
            updated_at: created_at,
            status: ScanRunStatus::Completed,
        }
    }

    #[test]
    fn test_scan_run_upsert_keeps_created_at() {
        let store = create_test_store();
        let first = Utc::now() - Duration::hours(1);

        store.record_scan_run(&run_record("/docs", first)).unwrap();

        let mut second = run_record("/docs", Utc::now());
        second.success_count = 3;
        second.error_count = 0;
        store.record_scan_run(&second).unwrap();

        let loaded = store.get_scan_run("/docs").unwrap().unwrap();
        assert_eq!(loaded.success_count, 3);
        assert_eq!(loaded.error_count, 0);
        assert_eq!(loaded.created_at.timestamp(), first.timestamp());
        assert_eq!(loaded.status, ScanRunStatus::Completed);

        assert_eq!(store.list_scan_runs().unwrap().len(), 1);
        assert!(store.get_scan_run("/other").unwrap().is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let store = create_test_store();

        assert_eq!(store.selected_extensions().unwrap(), vec!["txt"]);
        assert!(store.last_directory().unwrap().is_none());

        store
            .set_selected_extensions(&["md".to_string(), "log".to_string()])
            .unwrap();
        store.set_last_directory("/home/me/notes").unwrap();

        assert_eq!(store.selected_extensions().unwrap(), vec!["md", "log"]);
        assert_eq!(
            store.last_directory().unwrap().as_deref(),
            Some("/home/me/notes")
        );

        store.set_selected_extensions(&[]).unwrap();
        assert!(store.selected_extensions().unwrap().is_empty());

        assert!(matches!(
            store.set_selected_extensions(&["a,b".to_string()]),
            Err(DocSiftError::Config { .. })
        ));
    }

    #[test]
    fn test_favorites() {
        let store = create_test_store();
        store
            .insert(&NewDocument::new("/a.txt", "a.txt", "txt", "docs", "alpha"))
            .unwrap();

        store.add_favorite("/a.txt").unwrap();
        store.add_favorite("/a.txt").unwrap();

        let favorites = store.list_favorites().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].file_name, "a.txt");

        assert!(matches!(
            store.add_favorite("/missing.txt"),
            Err(DocSiftError::NotFound { .. })
        ));

        assert!(store.remove_favorite("/a.txt").unwrap());
        assert!(!store.remove_favorite("/a.txt").unwrap());
        assert!(store.list_favorites().unwrap().is_empty());
    }

    #[test]
    fn test_scan_error_ledger() {
        let store = create_test_store();
        store
            .record_scan_error("docs", "broken.txt", "invalid utf-8", "decode")
            .unwrap();

        let errors = store.list_scan_errors().unwrap();
        assert_eq!(
            errors,
            vec![ScanErrorRecord {
                directory: "docs".into(),
                name: "broken.txt".into(),
                message: "invalid utf-8".into(),
                category: "decode".into(),
            }]
        );

        assert_eq!(store.clear_scan_errors().unwrap(), 1);
        assert!(store.list_scan_errors().unwrap().is_empty());
    }
}
