//! docsift core - document index engine.
//!
//! Stores the text of files from a directory tree in SQLite, keeps an FTS5
//! index in step with it, and searches it by file name and content.
//!
//! # Example
//!
//! ```rust,ignore
//! use docsift_core::{build_query, DocumentStore, IngestionPipeline, ScanRequest};
//!
//! fn main() -> docsift_core::Result<()> {
//!     let store = DocumentStore::open("/tmp/docsift.sqlite")?;
//!
//!     let request = ScanRequest::new("/home/me/notes").with_extensions(["txt", "md"]);
//!     IngestionPipeline::new(&store).run(&request, |done, total| {
//!         println!("{}/{}", done, total);
//!     })?;
//!
//!     if let Some(query) = build_query("report", "error") {
//!         for hit in store.search(&query)? {
//!             println!("{} ({})", hit.file_name, hit.id);
//!         }
//!     }
//!
//!     store.close()
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod scanner;

mod api;

pub use api::{DocSift, IndexOutcome};
pub use error::{DocSiftError, Result};
pub use index::{
    build_query, DocumentStore, FtsConfig, QueryExpression, ScanErrorRecord, ScanRunRecord,
    ScanRunStatus, SyncReport,
};
pub use models::{Document, DocumentUpdate, NewDocument, ScanStats, SearchResult};
pub use scanner::{
    ErrorSink, FileEntry, FileSystemWalker, IngestionPipeline, LedgerErrorSink,
    PlainTextExtractor, ScanRequest, ScanState, TextExtractor, WalkDirWalker,
};
