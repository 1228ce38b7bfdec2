//! TreeSynchronizer implementation
//!
//! One call to [`TreeSynchronizer::sync`] is one tick: snapshot both trees,
//! plan, apply. Nothing is remembered between calls.

use std::fs;
use std::path::{Path, PathBuf};

use mirror_fs::io::{self, RobustnessConfig};

use crate::inventory::TreeInventory;
use crate::{Error, Result};

use super::plan::{SyncOp, SyncPlan};
use super::report::{FileError, SyncReport};

/// Options for sync operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compute the plan and report it without touching the replica.
    pub dry_run: bool,
    /// Digest candidate files on the rayon pool.
    pub parallel: bool,
    /// Remove directories that deletions leave empty.
    pub prune_empty_dirs: bool,
    /// Write-path settings for copies.
    pub robustness: RobustnessConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            parallel: true,
            prune_empty_dirs: false,
            robustness: RobustnessConfig::default(),
        }
    }
}

/// Mirrors a source tree onto a replica tree.
///
/// The synchronizer holds only its options, so one instance can serve any
/// number of root pairs and ticks. Callers must not run two ticks over the
/// same replica at once.
#[derive(Debug, Clone, Default)]
pub struct TreeSynchronizer {
    options: SyncOptions,
}

impl TreeSynchronizer {
    pub fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Work out what a tick would do, without writing anything.
    ///
    /// A replica root that does not exist yet is treated as empty.
    ///
    /// # Errors
    ///
    /// [`Error::SourceUnreadable`], [`Error::OverlappingRoots`], or
    /// [`Error::ReplicaUnwritable`] if the replica root exists but cannot be
    /// listed.
    pub fn plan(&self, source_root: &Path, replica_root: &Path) -> Result<SyncPlan> {
        check_roots(source_root, replica_root)?;

        let source = TreeInventory::scan(source_root)
            .map_err(|e| Error::source_unreadable(source_root, e))?;
        let replica = if fs::symlink_metadata(replica_root).is_ok() {
            TreeInventory::scan(replica_root)
                .map_err(|e| Error::replica_unwritable(replica_root, e))?
        } else {
            TreeInventory::empty(replica_root)
        };

        Ok(SyncPlan::compute(&source, &replica, self.options.parallel))
    }

    /// Run one tick: make `replica_root` mirror `source_root`.
    ///
    /// Per-file failures are collected in the returned report and do not stop
    /// the tick. With [`SyncOptions::dry_run`] this is [`plan`](Self::plan)
    /// rendered as a report.
    ///
    /// # Errors
    ///
    /// Returns a tick-fatal error, before any copy or delete, when the source
    /// cannot be read, the replica root cannot be created or listed, or the
    /// roots overlap.
    pub fn sync(&self, source_root: &Path, replica_root: &Path) -> Result<SyncReport> {
        let span = tracing::info_span!(
            "sync",
            source = %source_root.display(),
            replica = %replica_root.display()
        );
        let _guard = span.enter();

        if self.options.dry_run {
            let report = self.plan(source_root, replica_root)?.to_report();
            tracing::info!("{}", report.summary());
            return Ok(report);
        }

        check_roots(source_root, replica_root)?;

        io::ensure_dir(replica_root).map_err(|e| match e {
            mirror_fs::Error::Write { source, .. } => Error::replica_unwritable(replica_root, source),
            other => Error::Fs(other),
        })?;

        let source = TreeInventory::scan(source_root)
            .map_err(|e| Error::source_unreadable(source_root, e))?;
        let replica = TreeInventory::scan(replica_root)
            .map_err(|e| Error::replica_unwritable(replica_root, e))?;

        let plan = SyncPlan::compute(&source, &replica, self.options.parallel);
        if plan.protected > 0 {
            tracing::warn!(
                kept = plan.protected,
                "kept replica files whose source directory could not be read"
            );
        }

        let report = self.apply(plan, &source, &replica);
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    fn apply(&self, plan: SyncPlan, source: &TreeInventory, replica: &TreeInventory) -> SyncReport {
        let mut report = SyncReport {
            unchanged: plan.unchanged,
            source_files: plan.source_files,
            replica_files: plan.replica_files,
            errors: plan.errors,
            ..SyncReport::default()
        };

        for op in plan.ops {
            match op {
                SyncOp::Delete(path) => {
                    let location = path.resolve(replica.root());
                    match io::remove_file(&location) {
                        Ok(()) => {
                            tracing::debug!(%path, "deleted");
                            if self.options.prune_empty_dirs {
                                self.prune(replica.root(), &location, &mut report);
                            }
                            report.deleted.push(path);
                        }
                        Err(err) => report.errors.push(FileError::from_fs(path, &err)),
                    }
                }
                SyncOp::Copy(path) => {
                    let Some(entry) = source.get(&path) else {
                        continue;
                    };
                    let target = path.resolve(replica.root());
                    let result = match path.parent() {
                        Some(parent) => io::ensure_real_dirs(replica.root(), &parent),
                        None => Ok(()),
                    }
                    .and_then(|()| io::copy_atomic(&entry.location, &target, self.options.robustness));
                    match result {
                        Ok(bytes) => {
                            tracing::debug!(%path, bytes, "copied");
                            report.copied.push(path);
                        }
                        Err(err) => report.errors.push(FileError::from_fs(path, &err)),
                    }
                }
            }
        }

        for error in &report.errors {
            tracing::warn!(path = %error.path, kind = %error.kind, "{}", error.message);
        }

        report
    }

    fn prune(&self, root: &Path, deleted: &Path, report: &mut SyncReport) {
        let Some(parent) = deleted.parent() else {
            return;
        };
        if let Err(err) = io::remove_empty_dirs(root, parent)
            && let Some(path) = parent
                .strip_prefix(root)
                .ok()
                .and_then(mirror_fs::RelativePath::new)
        {
            report.errors.push(FileError::from_fs(path, &err));
        }
    }
}

/// Reject root pairs where one tree contains the other.
fn check_roots(source_root: &Path, replica_root: &Path) -> Result<()> {
    let source = dunce::canonicalize(source_root)
        .map_err(|e| Error::source_unreadable(source_root, e))?;
    let replica = resolve_lenient(replica_root);

    if source.starts_with(&replica) || replica.starts_with(&source) {
        return Err(Error::OverlappingRoots {
            source_root: source_root.to_path_buf(),
            replica_root: replica_root.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize as much of `path` as exists and append the rest.
fn resolve_lenient(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();

    loop {
        if let Ok(canonical) = dunce::canonicalize(existing) {
            let mut resolved = canonical;
            resolved.extend(rest.iter().rev());
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_lenient_handles_missing_tail() {
        let dir = TempDir::new().unwrap();
        let canonical = dunce::canonicalize(dir.path()).unwrap();

        let resolved = resolve_lenient(&dir.path().join("not").join("yet"));

        assert_eq!(resolved, canonical.join("not").join("yet"));
    }

    #[test]
    fn test_check_roots_rejects_nesting_both_ways() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("inner");
        fs::create_dir(&inner).unwrap();

        assert!(matches!(
            check_roots(dir.path(), &inner),
            Err(Error::OverlappingRoots { .. })
        ));
        assert!(matches!(
            check_roots(&inner, dir.path()),
            Err(Error::OverlappingRoots { .. })
        ));
        assert!(matches!(
            check_roots(dir.path(), dir.path()),
            Err(Error::OverlappingRoots { .. })
        ));
    }

    #[test]
    fn test_check_roots_accepts_siblings_with_shared_prefix() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("data");
        fs::create_dir(&source).unwrap();

        assert!(check_roots(&source, &dir.path().join("data-replica")).is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert!(!options.dry_run);
        assert!(options.parallel);
        assert!(!options.prune_empty_dirs);
    }
}
