//! Reporting of files skipped during ingestion.

use crate::error::DocSiftError;
use crate::index::DocumentStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Receives every file the ingestion pipeline had to skip.
pub trait ErrorSink {
    fn report(&self, directory: &str, file_name: &str, error: &DocSiftError);
}

/// Writes skipped files to the store's `scan_errors` table.
pub struct LedgerErrorSink<'a> {
    store: &'a DocumentStore,
    reported: AtomicUsize,
}

impl<'a> LedgerErrorSink<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self {
            store,
            reported: AtomicUsize::new(0),
        }
    }

    /// Number of files reported so far.
    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::SeqCst)
    }
}

impl ErrorSink for LedgerErrorSink<'_> {
    fn report(&self, directory: &str, file_name: &str, error: &DocSiftError) {
        self.reported.fetch_add(1, Ordering::SeqCst);
        if let Err(e) =
            self.store
                .record_scan_error(directory, file_name, &error.to_string(), error.category())
        {
            warn!("Failed to record scan error for {}: {}", file_name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionKind;
    use std::path::PathBuf;

    #[test]
    fn test_ledger_sink_records_errors() {
        let store = DocumentStore::open_in_memory().unwrap();
        let sink = LedgerErrorSink::new(&store);

        let err = DocSiftError::Extraction {
            path: PathBuf::from("/docs/bad.txt"),
            message: "invalid utf-8 sequence".into(),
            kind: ExtractionKind::Decode,
        };
        sink.report("docs", "bad.txt", &err);

        assert_eq!(sink.reported(), 1);
        let errors = store.list_scan_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "bad.txt");
        assert_eq!(errors[0].category, "decode");
        assert!(errors[0].message.contains("invalid utf-8"));
    }
}
