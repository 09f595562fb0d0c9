//! Directory scanning and ingestion.
//!
//! The pipeline depends on three collaborators:
//! - `FileSystemWalker` lists everything under a root
//! - `TextExtractor` turns a file into text
//! - `ErrorSink` (optional) hears about every skipped file

mod error_sink;
mod extractor;
mod pipeline;
mod walker;

pub use error_sink::{ErrorSink, LedgerErrorSink};
pub use extractor::{PlainTextExtractor, TextExtractor};
pub use pipeline::{
    normalize_extension, normalize_extension_filter, IngestionPipeline, ScanRequest, ScanState,
};
pub use walker::{FileEntry, FileSystemWalker, WalkDirWalker};
