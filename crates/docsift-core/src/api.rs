//! Async entry point over the document store and the ingestion pipeline.
//!
//! All SQLite and file system work runs on tokio's blocking pool.

use crate::error::{DocSiftError, Result};
use crate::index::{build_query, DocumentStore, ScanRunRecord, ScanRunStatus};
use crate::models::{NewDocument, ScanStats, SearchResult};
use crate::scanner::{IngestionPipeline, LedgerErrorSink, ScanRequest};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of `DocSift::index_directory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutcome {
    pub stats: ScanStats,
    /// Files reported to the error ledger during the run.
    pub skipped: usize,
}

impl IndexOutcome {
    pub fn indexed(&self) -> usize {
        self.stats.processed_count.saturating_sub(self.skipped)
    }
}

/// Main API struct for docsift.
///
/// Owns the store handle; clones of the inner `Arc` are handed to blocking tasks.
pub struct DocSift {
    store: Arc<DocumentStore>,
}

impl DocSift {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Open (or create) the database at `db_path`.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(DocumentStore::open(db_path)?))
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DocumentStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| DocSiftError::Other(format!("Background task failed: {}", e)))?
    }

    /// Store one document directly. Returns its sequence id.
    pub async fn insert_document(
        &self,
        path: &str,
        file_name: &str,
        content: &str,
        extension: &str,
        directory: &str,
    ) -> Result<i64> {
        let document = NewDocument::new(path, file_name, extension, directory, content);
        self.blocking(move |store| store.insert(&document)).await
    }

    /// Run an already-built MATCH string.
    pub async fn search(&self, match_query: &str) -> Result<Vec<SearchResult>> {
        let match_query = match_query.to_string();
        self.blocking(move |store| store.search_raw(&match_query)).await
    }

    /// Build a query from the two search boxes and run it.
    ///
    /// Blank input performs no search and returns no results.
    pub async fn search_terms(
        &self,
        name_term: &str,
        content_term: &str,
    ) -> Result<Vec<SearchResult>> {
        let Some(query) = build_query(name_term, content_term) else {
            return Ok(Vec::new());
        };
        self.blocking(move |store| store.search(&query)).await
    }

    /// Ingest a directory, record the run summary and remember the directory.
    ///
    /// The run is recorded as running before the walk starts and as completed
    /// or failed once it ends. `on_progress` is called from the blocking task, in order.
    pub async fn index_directory<F>(
        &self,
        request: ScanRequest,
        on_progress: F,
    ) -> Result<IndexOutcome>
    where
        F: FnMut(usize, usize) + Send + 'static,
    {
        self.blocking(move |store| {
            let root = request.root.to_string_lossy().to_string();
            let mut run = ScanRunRecord {
                path: root.clone(),
                discovered_count: 0,
                success_count: 0,
                error_count: 0,
                index_size: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                status: ScanRunStatus::Running,
            };
            store.record_scan_run(&run)?;

            let sink = LedgerErrorSink::new(store);
            let result = IngestionPipeline::new(store)
                .with_error_sink(&sink)
                .run(&request, on_progress);

            let stats = match result {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("Scan of {} failed: {}", root, e);
                    run.status = ScanRunStatus::Failed;
                    run.updated_at = Utc::now();
                    store.record_scan_run(&run)?;
                    return Err(e);
                }
            };

            let outcome = IndexOutcome {
                stats,
                skipped: sink.reported(),
            };

            if store.db_path().is_some() {
                store.checkpoint_wal()?;
            }

            run.discovered_count = stats.total_discovered;
            run.success_count = outcome.indexed();
            run.error_count = outcome.skipped;
            run.index_size = store
                .db_path()
                .and_then(|p| std::fs::metadata(p).ok())
                .map(|m| m.len())
                .unwrap_or(0);
            run.updated_at = Utc::now();
            run.status = ScanRunStatus::Completed;
            store.record_scan_run(&run)?;
            store.set_last_directory(&root)?;

            info!(
                "Indexed {} of {} files under {}",
                outcome.indexed(),
                stats.total_discovered,
                root
            );
            Ok(outcome)
        })
        .await
    }

    /// Run synchronous store work on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DocumentStore) -> Result<T> + Send + 'static,
    {
        self.blocking(f).await
    }

    /// Close the store. Fails if a background task still holds it.
    pub fn close(self) -> Result<()> {
        let store = Arc::try_unwrap(self.store)
            .map_err(|_| DocSiftError::Other("Document store is still in use".to_string()))?;
        store.close()
    }
}
