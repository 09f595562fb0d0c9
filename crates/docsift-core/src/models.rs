//! Data types shared across the store, the search executor and the ingester.

use serde::{Deserialize, Serialize};

/// A stored document row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Surrogate key linking the row to its full-text entry. Never shown to users.
    #[serde(skip)]
    pub sequence_id: i64,
    /// Stable external identifier of the file (resolved path or URI).
    pub id: String,
    pub name: String,
    /// Lower-cased, no leading dot. Empty when the name has no dot.
    pub extension: String,
    /// Logical label of the scan root, not necessarily a real path.
    pub directory: String,
    pub content: String,
}

/// A document that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub id: String,
    pub name: String,
    pub extension: String,
    pub directory: String,
    pub content: String,
}

impl NewDocument {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        directory: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extension: extension.into(),
            directory: directory.into(),
            content: content.into(),
        }
    }
}

/// Replacement values for the searchable fields of an existing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    pub name: String,
    pub extension: String,
    pub content: String,
}

/// One search hit. Never carries document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub file_name: String,
    pub directory: String,
    pub extension: String,
}

/// Counters for a single ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub total_discovered: usize,
    pub processed_count: usize,
}

impl ScanStats {
    /// Fraction of kept files processed so far, `0.0` when nothing was kept.
    pub fn progress(&self) -> f32 {
        if self.total_discovered == 0 {
            0.0
        } else {
            self.processed_count as f32 / self.total_discovered as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_stats_progress() {
        assert_eq!(ScanStats::default().progress(), 0.0);

        let stats = ScanStats {
            total_discovered: 4,
            processed_count: 1,
        };
        assert!((stats.progress() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_search_result_serializes_camel_case() {
        let result = SearchResult {
            id: "/docs/a.txt".into(),
            file_name: "a.txt".into(),
            directory: "docs".into(),
            extension: "txt".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["fileName"], "a.txt");
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_document_hides_sequence_id() {
        let doc = Document {
            sequence_id: 7,
            id: "/docs/a.txt".into(),
            name: "a.txt".into(),
            extension: "txt".into(),
            directory: "docs".into(),
            content: "hello".into(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("sequenceId").is_none());
    }
}
