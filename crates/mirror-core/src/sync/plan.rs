//! Deciding what a tick has to do
//!
//! A plan is derived from exactly one pair of inventories. Each relative
//! path appears in at most one operation.

use mirror_fs::{RelativePath, fingerprint_file};
use rayon::prelude::*;

use crate::inventory::{FileEntry, TreeInventory};

use super::report::{FileError, SyncReport};

/// A single change to the replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOp {
    /// Copy the source file over the replica path
    Copy(RelativePath),
    /// Remove the replica file
    Delete(RelativePath),
}

impl SyncOp {
    pub fn path(&self) -> &RelativePath {
        match self {
            Self::Copy(path) | Self::Delete(path) => path,
        }
    }
}

/// The operations needed to converge a replica on its source.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Deletes first, then copies, each group in path order
    pub ops: Vec<SyncOp>,
    /// Source files already matching the replica
    pub unchanged: usize,
    /// Replica files kept because the matching source path could not be read
    pub protected: usize,
    /// Failures hit while scanning or digesting
    pub errors: Vec<FileError>,
    pub source_files: usize,
    pub replica_files: usize,
}

enum Verdict {
    Unchanged,
    Copy,
    Failed(FileError),
}

impl SyncPlan {
    /// Compare two inventories.
    ///
    /// With `parallel` set, digests are computed on the rayon pool. The
    /// result is identical either way.
    pub fn compute(source: &TreeInventory, replica: &TreeInventory, parallel: bool) -> Self {
        let mut plan = Self {
            source_files: source.len(),
            replica_files: replica.len(),
            ..Self::default()
        };

        for unreadable in source.unreadable().iter().chain(replica.unreadable()) {
            plan.errors
                .push(FileError::read(unreadable.path.clone(), unreadable.message.clone()));
        }

        for entry in replica.entries() {
            if source.contains(&entry.path) {
                continue;
            }
            if source.is_shadowed(&entry.path) {
                tracing::debug!(path = %entry.path, "source side unreadable, keeping replica file");
                plan.protected += 1;
                continue;
            }
            plan.ops.push(SyncOp::Delete(entry.path.clone()));
        }

        let candidates: Vec<&FileEntry> = source.entries().collect();
        let verdicts: Vec<(&FileEntry, Verdict)> = if parallel {
            candidates
                .par_iter()
                .map(|&entry| (entry, compare(entry, replica.get(&entry.path))))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&entry| (entry, compare(entry, replica.get(&entry.path))))
                .collect()
        };

        for (entry, verdict) in verdicts {
            match verdict {
                Verdict::Unchanged => plan.unchanged += 1,
                Verdict::Copy => plan.ops.push(SyncOp::Copy(entry.path.clone())),
                Verdict::Failed(error) => plan.errors.push(error),
            }
        }

        plan
    }

    pub fn copies(&self) -> impl Iterator<Item = &RelativePath> {
        self.ops.iter().filter_map(|op| match op {
            SyncOp::Copy(path) => Some(path),
            SyncOp::Delete(_) => None,
        })
    }

    pub fn deletes(&self) -> impl Iterator<Item = &RelativePath> {
        self.ops.iter().filter_map(|op| match op {
            SyncOp::Delete(path) => Some(path),
            SyncOp::Copy(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// What the tick would report if every operation succeeded.
    pub fn to_report(&self) -> SyncReport {
        SyncReport {
            copied: self.copies().cloned().collect(),
            deleted: self.deletes().cloned().collect(),
            unchanged: self.unchanged,
            errors: self.errors.clone(),
            source_files: self.source_files,
            replica_files: self.replica_files,
            dry_run: true,
        }
    }
}

fn compare(source: &FileEntry, replica: Option<&FileEntry>) -> Verdict {
    let Some(replica) = replica else {
        return Verdict::Copy;
    };

    if source.size != replica.size {
        return Verdict::Copy;
    }

    let source_digest = match fingerprint_file(&source.location) {
        Ok(digest) => digest,
        Err(err) => return Verdict::Failed(FileError::from_fs(source.path.clone(), &err)),
    };

    match fingerprint_file(&replica.location) {
        Ok(replica_digest) if replica_digest == source_digest => Verdict::Unchanged,
        Ok(_) => Verdict::Copy,
        Err(err) => {
            tracing::debug!(path = %replica.path, error = %err, "replica unreadable, overwriting");
            Verdict::Copy
        }
    }
}
