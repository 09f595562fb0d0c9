//! Directory ingestion: walk, filter, extract, store.
//!
//! A run moves through `NotStarted -> Scanning -> Ingesting -> Completed`.
//! Per-file failures are reported and skipped; they never end a run early.

use crate::config::IngestConfig;
use crate::error::Result;
use crate::index::DocumentStore;
use crate::models::{NewDocument, ScanStats};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::error_sink::ErrorSink;
use super::extractor::{PlainTextExtractor, TextExtractor};
use super::walker::{FileEntry, FileSystemWalker, WalkDirWalker};

/// Where an ingestion run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ScanState {
    NotStarted,
    /// Enumerating files under the root.
    Scanning,
    /// Reading and storing kept files.
    Ingesting { processed: usize, total: usize },
    Completed { processed: usize, total: usize },
}

impl ScanState {
    /// Whether a run is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(self, ScanState::Scanning | ScanState::Ingesting { .. })
    }

    /// Fraction of kept files processed, `0.0` before ingestion starts or when nothing was kept.
    pub fn progress(&self) -> f32 {
        match *self {
            ScanState::Ingesting { processed, total }
            | ScanState::Completed { processed, total } => ScanStats {
                total_discovered: total,
                processed_count: processed,
            }
            .progress(),
            _ => 0.0,
        }
    }
}

/// What to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub root: PathBuf,
    /// Stored as every document's `directory`. Defaults to the root's last component.
    pub directory_label: Option<String>,
    /// Extensions to keep. Empty keeps every file.
    pub extensions: Vec<String>,
}

impl ScanRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            directory_label: None,
            extensions: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.directory_label = Some(label.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// The label stored on every document of this run.
    pub fn directory_label(&self) -> String {
        if let Some(label) = &self.directory_label {
            return label.clone();
        }
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| IngestConfig::FALLBACK_DIRECTORY_LABEL.to_string())
    }
}

/// Extension of a file name: text after the last `.`, lower-cased. Empty when there is no dot.
pub fn normalize_extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => file_name[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}

/// Normalize a user-supplied extension list: trim, lower-case, drop one leading dot, drop empties.
pub fn normalize_extension_filter<S: AsRef<str>>(extensions: &[S]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| {
            let e = e.as_ref().trim().to_lowercase();
            e.strip_prefix('.').map(str::to_string).unwrap_or(e)
        })
        .filter(|e| !e.is_empty())
        .collect()
}

type StateListener<'a> = Box<dyn FnMut(&ScanState) + 'a>;

/// Walks a directory tree and stores every kept file as a document.
pub struct IngestionPipeline<'a, W = WalkDirWalker, E = PlainTextExtractor> {
    store: &'a DocumentStore,
    walker: W,
    extractor: E,
    error_sink: Option<&'a dyn ErrorSink>,
    state: ScanState,
    state_listener: Option<StateListener<'a>>,
}

impl<'a> IngestionPipeline<'a> {
    /// Pipeline over the local file system that reads files as UTF-8 text.
    pub fn new(store: &'a DocumentStore) -> Self {
        Self::with_collaborators(store, WalkDirWalker::new(), PlainTextExtractor::new())
    }
}

impl<'a, W, E> IngestionPipeline<'a, W, E>
where
    W: FileSystemWalker,
    E: TextExtractor,
{
    pub fn with_collaborators(store: &'a DocumentStore, walker: W, extractor: E) -> Self {
        Self {
            store,
            walker,
            extractor,
            error_sink: None,
            state: ScanState::NotStarted,
            state_listener: None,
        }
    }

    pub fn with_error_sink(mut self, sink: &'a dyn ErrorSink) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Called on every state transition, including each progress step.
    pub fn with_state_listener(mut self, listener: impl FnMut(&ScanState) + 'a) -> Self {
        self.state_listener = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    fn transition(&mut self, next: ScanState) {
        self.state = next;
        if let Some(listener) = self.state_listener.as_mut() {
            listener(&self.state);
        }
    }

    /// Ingest everything under `request.root` that passes the extension filter.
    ///
    /// `on_progress(processed, total)` is called once with `processed = 0` before
    /// the first file, then once after every file whether it succeeded or not.
    /// Fails only when the root cannot be listed; the state then returns to
    /// `NotStarted` and `on_progress` is never called. The store's own database
    /// files are left out when they sit under the root.
    pub fn run<F>(&mut self, request: &ScanRequest, mut on_progress: F) -> Result<ScanStats>
    where
        F: FnMut(usize, usize),
    {
        let filter = normalize_extension_filter(&request.extensions);
        let label = request.directory_label();

        info!(
            "Starting scan of {} (label={}, extensions={:?})",
            request.root.display(),
            label,
            filter
        );
        self.transition(ScanState::Scanning);

        let entries = match self.walker.walk(&request.root) {
            Ok(entries) => entries,
            Err(e) => {
                self.transition(ScanState::NotStarted);
                return Err(e);
            }
        };

        let store_files = self.store_files();
        let files: Vec<FileEntry> = entries
            .into_iter()
            .filter(|entry| entry.is_file)
            .filter(|entry| filter.is_empty() || filter.contains(&normalize_extension(&entry.name)))
            .filter(|entry| !is_store_file(&store_files, entry))
            .collect();

        let total = files.len();
        let mut processed = 0;
        self.transition(ScanState::Ingesting { processed, total });
        on_progress(processed, total);

        for entry in &files {
            match self.ingest_file(entry, &label) {
                Ok(sequence_id) => debug!("Indexed {} as #{}", entry.stable_id, sequence_id),
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path.display(), e);
                    if let Some(sink) = self.error_sink {
                        sink.report(&label, &entry.name, &e);
                    }
                }
            }

            processed += 1;
            self.transition(ScanState::Ingesting { processed, total });
            on_progress(processed, total);
        }

        self.transition(ScanState::Completed { processed, total });
        info!(
            "Finished scan of {}: processed {} of {} files",
            request.root.display(),
            processed,
            total
        );

        Ok(ScanStats {
            total_discovered: total,
            processed_count: processed,
        })
    }

    /// The store's database file and its SQLite sidecars, when the store is file-backed.
    fn store_files(&self) -> HashSet<PathBuf> {
        let Some(db_path) = self.store.db_path() else {
            return HashSet::new();
        };
        let db_path = std::fs::canonicalize(db_path).unwrap_or_else(|_| db_path.to_path_buf());

        ["", "-wal", "-shm", "-journal"]
            .iter()
            .map(|suffix| {
                let mut path = db_path.clone().into_os_string();
                path.push(suffix);
                PathBuf::from(path)
            })
            .collect()
    }

    fn ingest_file(&self, entry: &FileEntry, label: &str) -> Result<i64> {
        let content = self.extractor.extract(entry)?;
        let document = NewDocument {
            id: entry.stable_id.clone(),
            name: entry.name.clone(),
            extension: normalize_extension(&entry.name),
            directory: label.to_string(),
            content,
        };
        self.store.insert(&document)
    }
}

fn is_store_file(store_files: &HashSet<PathBuf>, entry: &FileEntry) -> bool {
    if store_files.is_empty() {
        return false;
    }
    let path = std::fs::canonicalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
    if store_files.contains(&path) {
        debug!("Leaving out the store's own file {}", entry.path.display());
        return true;
    }
    false
}
