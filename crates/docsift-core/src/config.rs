//! Centralized configuration for docsift.
//!
//! Constants for the store and the ingestion pipeline, plus the keys used for
//! runtime settings persisted in the `settings` table.

use std::time::Duration;

/// Store-level configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const DB_FILE_NAME: &'static str = "docsift.sqlite";
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DOCUMENTS_TABLE: &'static str = "documents";
    pub const FTS_TABLE: &'static str = "documents_fts";
    pub const FTS_TOKENIZER: &'static str = "unicode61 remove_diacritics 1";
}

/// Ingestion pipeline configuration.
pub struct IngestConfig;

impl IngestConfig {
    /// Files larger than this are skipped by the plain text extractor.
    pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;
    /// Label used when the scan root has no final path component.
    pub const FALLBACK_DIRECTORY_LABEL: &'static str = "root";
    /// Extensions indexed when nothing else has been configured.
    pub const DEFAULT_EXTENSIONS: &'static [&'static str] = &["txt"];
}

/// Keys for the persisted `settings` table.
pub struct SettingKeys;

impl SettingKeys {
    pub const EXTENSIONS: &'static str = "extensions";
    pub const LAST_DIRECTORY: &'static str = "last_directory";
}
