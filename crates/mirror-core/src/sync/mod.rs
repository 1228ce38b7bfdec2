//! One-way synchronization of a replica tree from a source tree
//!
//! - **plan**: compare two inventories and decide on copies and deletes
//! - **engine**: `TreeSynchronizer`, which snapshots, plans and applies
//! - **report**: per-tick outcome and per-file errors

mod engine;
mod plan;
mod report;

pub use engine::{SyncOptions, TreeSynchronizer};
pub use plan::{SyncOp, SyncPlan};
pub use report::{FileError, FileErrorKind, SyncReport};
