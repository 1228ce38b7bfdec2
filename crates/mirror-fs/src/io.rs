//! Atomic copy and removal primitives
//!
//! Replica files are never written in place: bytes go to a temporary sibling
//! which is renamed over the target once complete, so a reader sees either
//! the old content or the new content.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use backoff::ExponentialBackoff;
use filetime::FileTime;
use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::{Error, RelativePath, Result};

/// Buffer size for streaming copies.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Knobs for the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to keep retrying the advisory lock on a temp file.
    pub lock_timeout: Duration,
    /// Flush temp files to disk before renaming them into place.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Temp file prefix used while replacing `target`.
///
/// The temp file lives next to the target so the final rename never crosses
/// filesystems. A random part follows the prefix and the name ends in `.tmp`.
pub fn temp_prefix_for(target: &Path) -> String {
    format!(
        ".{}.",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    )
}

/// Create `dir` and any missing parents.
///
/// Fails if something other than a directory already occupies the path.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::write(dir, e))
}

/// Make every segment of `relative` under `root` a real directory.
///
/// Symlinks and other non-directories found on the way are removed and
/// replaced, so nothing written below `relative` can land outside `root`.
/// A symlink is unlinked, never followed.
pub fn ensure_real_dirs(root: &Path, relative: &RelativePath) -> Result<()> {
    let mut current = root.to_path_buf();
    for segment in relative.segments() {
        current.push(segment);
        match fs::symlink_metadata(&current) {
            Ok(metadata) if metadata.is_dir() => continue,
            Ok(_) => {
                tracing::debug!(path = %current.display(), "replacing non-directory with directory");
                fs::remove_file(&current)
                    .or_else(|_| fs::remove_dir(&current))
                    .map_err(|e| Error::write(&current, e))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::write(&current, e)),
        }
        fs::create_dir(&current).map_err(|e| Error::write(&current, e))?;
    }
    Ok(())
}

/// Copy `source` over `target` using write-then-rename.
///
/// Missing parent directories of `target` are created. If `target` is a
/// directory it is removed just before the rename. Permissions and
/// access/modification times of `source` are carried over. Returns the number
/// of bytes copied.
///
/// # Errors
///
/// [`Error::Read`] when the source cannot be opened or read, [`Error::Write`]
/// for every failure on the target side, [`Error::LockFailed`] if the temp
/// file could not be locked within `config.lock_timeout`. A failure while
/// the temp file is being filled leaves the target untouched, and the temp
/// file is always removed.
pub fn copy_atomic(source: &Path, target: &Path, config: RobustnessConfig) -> Result<u64> {
    let mut source_file = File::open(source).map_err(|e| Error::read(source, e))?;
    let metadata = source_file.metadata().map_err(|e| Error::read(source, e))?;

    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(&temp_prefix_for(target))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| Error::write(parent, e))?;

    let copied = fill_temp(&mut source_file, source, &mut temp, &metadata, config)?;

    if let Ok(existing) = fs::symlink_metadata(target)
        && existing.is_dir()
    {
        tracing::debug!(target = %target.display(), "replacing directory with file");
        fs::remove_dir_all(target).map_err(|e| Error::write(target, e))?;
    }

    temp.persist(target)
        .map_err(|e| Error::write(target, e.error))?;
    Ok(copied)
}

fn fill_temp(
    source_file: &mut File,
    source: &Path,
    temp: &mut NamedTempFile,
    metadata: &fs::Metadata,
    config: RobustnessConfig,
) -> Result<u64> {
    let temp_path = temp.path().to_path_buf();
    lock_with_retry(temp.as_file(), &temp_path, config.lock_timeout)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        let read = match source_file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::read(source, e)),
        };
        temp.write_all(&buffer[..read])
            .map_err(|e| Error::write(&temp_path, e))?;
        copied += read as u64;
    }

    if config.enable_fsync {
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::write(&temp_path, e))?;
    }

    temp.as_file().unlock().map_err(|_| Error::LockFailed {
        path: temp_path.clone(),
    })?;

    // Times last: any write after this point would bump the mtime again.
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = FileTime::from_last_modification_time(metadata);
    filetime::set_file_handle_times(temp.as_file(), Some(atime), Some(mtime))
        .map_err(|e| Error::write(&temp_path, e))?;
    temp.as_file()
        .set_permissions(metadata.permissions())
        .map_err(|e| Error::write(&temp_path, e))?;

    Ok(copied)
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::write(path, e))
}

/// Remove `dir` and then each parent in turn while they are empty, stopping
/// at `root` (which is never removed). Returns how many directories went.
pub fn remove_empty_dirs(root: &Path, dir: &Path) -> Result<usize> {
    let mut removed = 0;
    let mut current = Some(dir);

    while let Some(candidate) = current {
        if candidate == root || !candidate.starts_with(root) {
            break;
        }
        let mut entries = fs::read_dir(candidate).map_err(|e| Error::read(candidate, e))?;
        if entries.next().is_some() {
            break;
        }
        fs::remove_dir(candidate).map_err(|e| Error::write(candidate, e))?;
        removed += 1;
        current = candidate.parent();
    }

    Ok(removed)
}
