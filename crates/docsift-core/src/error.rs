//! Error types for docsift.
//!
//! Structural failures (store unavailable, malformed queries) surface to callers.
//! Per-file extraction failures are handled inside the ingestion pipeline and
//! never abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the docsift library.
#[derive(Debug, Error)]
pub enum DocSiftError {
    // Storage errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Content extraction errors
    #[error("Extraction failed for {path}: {message}")]
    Extraction {
        path: PathBuf,
        message: String,
        kind: ExtractionKind,
    },

    // Caller errors
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {key}")]
    NotFound { key: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Why a file's text could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    Read,
    Decode,
    TooLarge,
}

impl ExtractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionKind::Read => "read",
            ExtractionKind::Decode => "decode",
            ExtractionKind::TooLarge => "too_large",
        }
    }
}

/// Result type alias for docsift operations.
pub type Result<T> = std::result::Result<T, DocSiftError>;

impl From<std::io::Error> for DocSiftError {
    fn from(err: std::io::Error) -> Self {
        DocSiftError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for DocSiftError {
    fn from(err: rusqlite::Error) -> Self {
        DocSiftError::Storage {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl DocSiftError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DocSiftError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DocSiftError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Coarse category recorded in the scan error ledger.
    ///
    /// - `read`: the file could not be opened or read
    /// - `decode`: the bytes were not valid UTF-8
    /// - `too_large`: the file exceeded the configured size limit
    /// - `storage`: the document could not be written
    pub fn category(&self) -> &'static str {
        match self {
            DocSiftError::Extraction { kind, .. } => kind.as_str(),
            DocSiftError::Io { .. } | DocSiftError::NotADirectory(_) => "read",
            DocSiftError::Storage { .. } => "storage",
            DocSiftError::InvalidArgument { .. } => "invalid_argument",
            DocSiftError::NotFound { .. } => "not_found",
            DocSiftError::Config { .. } => "config",
            DocSiftError::Other(_) => "other",
        }
    }

    /// Whether the error came from the persistent store.
    pub fn is_storage(&self) -> bool {
        matches!(self, DocSiftError::Storage { .. })
    }
}
