//! SQLite document store with FTS5 full-text search.
//!
//! This module provides:
//! - Document storage in SQLite
//! - An FTS5 index kept in step with it, transaction by transaction
//! - Query building and search execution
//! - Side tables for scan runs, settings, favorites and skipped files

mod document_store;
mod fts5;
mod ledger;
mod query;
mod schema;

pub use document_store::{DocumentStore, SyncReport};
pub use fts5::{FtsConfig, FtsManager, FtsStats};
pub use ledger::{ScanErrorRecord, ScanRunRecord, ScanRunStatus};
pub use query::{build_query, QueryClause, QueryExpression, QueryField};
