//! Error types for mirror-core
//!
//! Everything here is fatal for a tick: `sync` returns it before any copy or
//! delete happens. Per-file failures are not errors at this level; they are
//! collected in [`SyncReport::errors`](crate::SyncReport::errors).

use std::path::PathBuf;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a synchronization tick
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source root is missing, not a directory, or cannot be listed
    #[error("Source unreadable at {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replica root cannot be created or is not a directory
    #[error("Replica unwritable at {path}: {source}")]
    ReplicaUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One root contains the other, or both name the same directory
    #[error("Source {source_root} and replica {replica_root} overlap")]
    OverlappingRoots {
        source_root: PathBuf,
        replica_root: PathBuf,
    },

    /// Configuration values are out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),
}

impl Error {
    pub(crate) fn source_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn replica_unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReplicaUnwritable {
            path: path.into(),
            source,
        }
    }
}
