//! Recursive directory listing.

use crate::error::{DocSiftError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One entry found under a scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Base name, e.g. `notes.txt`.
    pub name: String,
    pub path: PathBuf,
    /// Identifier that stays the same across scans, used as the document id.
    pub stable_id: String,
    pub is_dir: bool,
    pub is_file: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// Build an entry for a regular file without touching the file system.
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            stable_id: path.to_string_lossy().to_string(),
            name,
            path,
            is_dir: false,
            is_file: true,
            size,
            modified: None,
        }
    }
}

/// Supplies a recursive listing of everything under a root.
pub trait FileSystemWalker {
    /// List all entries below `root`, directories included, in any order.
    fn walk(&self, root: &Path) -> Result<Vec<FileEntry>>;
}

/// Walker over the local file system.
///
/// Symlinks are not followed. Entries that cannot be read are logged and left out.
#[derive(Debug, Clone, Default)]
pub struct WalkDirWalker {
    follow_links: bool,
}

impl WalkDirWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

impl FileSystemWalker for WalkDirWalker {
    fn walk(&self, root: &Path) -> Result<Vec<FileEntry>> {
        if !root.is_dir() {
            return Err(DocSiftError::NotADirectory(root.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.follow_links)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            let metadata = entry.metadata().ok();
            let path = entry.path().to_path_buf();
            let stable_id = std::fs::canonicalize(&path)
                .unwrap_or_else(|_| path.clone())
                .to_string_lossy()
                .to_string();

            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                stable_id,
                is_dir: file_type.is_dir(),
                is_file: file_type.is_file(),
                size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                modified: metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from),
                path,
            });
        }

        Ok(entries)
    }
}
