//! Report types for synchronization ticks

use std::fmt;

use mirror_fs::RelativePath;
use serde::Serialize;

/// Which side of a per-file operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    /// Listing, stat'ing, opening or reading failed
    Read,
    /// Creating, writing, renaming or removing in the replica failed
    Write,
}

impl fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// A failure confined to a single path. The tick carries on past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    /// Path relative to the tree root
    pub path: RelativePath,
    pub kind: FileErrorKind,
    /// Human-readable cause
    pub message: String,
}

impl FileError {
    pub fn read(path: RelativePath, message: impl Into<String>) -> Self {
        Self {
            path,
            kind: FileErrorKind::Read,
            message: message.into(),
        }
    }

    pub fn write(path: RelativePath, message: impl Into<String>) -> Self {
        Self {
            path,
            kind: FileErrorKind::Write,
            message: message.into(),
        }
    }

    /// Classify a mirror-fs error against `path`.
    pub fn from_fs(path: RelativePath, err: &mirror_fs::Error) -> Self {
        if err.is_read() {
            Self::read(path, err.to_string())
        } else {
            Self::write(path, err.to_string())
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error on {}: {}", self.kind, self.path, self.message)
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Paths copied or overwritten in the replica
    pub copied: Vec<RelativePath>,
    /// Paths removed from the replica
    pub deleted: Vec<RelativePath>,
    /// Paths whose content already matched
    pub unchanged: usize,
    /// Per-file failures, in the order they happened
    pub errors: Vec<FileError>,
    /// Regular files found in the source
    pub source_files: usize,
    /// Regular files found in the replica before any change
    pub replica_files: usize,
    /// True if nothing was actually written
    pub dry_run: bool,
}

impl SyncReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// No per-file errors occurred.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// No copies and no deletes were needed.
    pub fn is_noop(&self) -> bool {
        self.copied.is_empty() && self.deleted.is_empty()
    }

    /// One-line summary suitable for a log.
    pub fn summary(&self) -> String {
        format!(
            "{}{} copied, {} deleted, {} unchanged, {} errors (source {} files, replica {} files)",
            if self.dry_run { "[dry-run] " } else { "" },
            self.copied_count(),
            self.deleted_count(),
            self.unchanged,
            self.errors.len(),
            self.source_files,
            self.replica_files,
        )
    }
}
