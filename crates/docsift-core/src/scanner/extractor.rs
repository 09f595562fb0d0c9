//! Turning files into text.

use crate::config::IngestConfig;
use crate::error::{DocSiftError, ExtractionKind, Result};

use super::walker::FileEntry;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Turns a file into UTF-8 text.
///
/// Any error makes the ingestion pipeline skip the file.
pub trait TextExtractor {
    fn extract(&self, entry: &FileEntry) -> Result<String>;
}

/// Reads files as UTF-8 text.
///
/// Content with NUL bytes is treated as binary and rejected even when it decodes.
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    max_bytes: u64,
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            max_bytes: IngestConfig::MAX_FILE_BYTES,
        }
    }
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn failure(entry: &FileEntry, kind: ExtractionKind, message: String) -> DocSiftError {
        DocSiftError::Extraction {
            path: entry.path.clone(),
            message,
            kind,
        }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, entry: &FileEntry) -> Result<String> {
        let metadata = std::fs::metadata(&entry.path)
            .map_err(|e| Self::failure(entry, ExtractionKind::Read, e.to_string()))?;
        if metadata.len() > self.max_bytes {
            return Err(Self::failure(
                entry,
                ExtractionKind::TooLarge,
                format!("{} bytes exceeds limit of {}", metadata.len(), self.max_bytes),
            ));
        }

        let bytes = std::fs::read(&entry.path)
            .map_err(|e| Self::failure(entry, ExtractionKind::Read, e.to_string()))?;
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
        if bytes.contains(&0) {
            return Err(Self::failure(
                entry,
                ExtractionKind::Decode,
                "contains NUL bytes, not a text file".to_string(),
            ));
        }

        String::from_utf8(bytes.to_vec())
            .map_err(|e| Self::failure(entry, ExtractionKind::Decode, e.to_string()))
    }
}
