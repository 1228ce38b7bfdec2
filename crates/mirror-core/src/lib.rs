//! Core synchronization engine for tree-mirror
//!
//! Mirrors a source directory onto a replica directory, one tick at a time:
//!
//! - **Inventories**: every regular file under a root, keyed by relative path
//! - **Plan**: copies for new or changed content, deletes for extra files
//! - **TreeSynchronizer**: applies the plan with per-file failure isolation
//! - **Configuration**: `MirrorConfig`, loaded from TOML, JSON or YAML
//!
//! # Architecture
//!
//! ```text
//!      mirror-cli (scheduler, logging)
//!                |
//!           mirror-core
//!                |
//!            mirror-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mirror_core::{SyncOptions, TreeSynchronizer};
//! use std::path::Path;
//!
//! let synchronizer = TreeSynchronizer::new(SyncOptions::default());
//! let report = synchronizer.sync(Path::new("data"), Path::new("backup"))?;
//! println!("{}", report.summary());
//! # Ok::<(), mirror_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod inventory;
pub mod sync;

pub use config::MirrorConfig;
pub use error::{Error, Result};
pub use inventory::{FileEntry, TreeInventory, UnreadableEntry};
pub use mirror_fs::RelativePath;
pub use sync::{
    FileError, FileErrorKind, SyncOp, SyncOptions, SyncPlan, SyncReport, TreeSynchronizer,
};
