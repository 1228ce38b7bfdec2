//! Tree inventories
//!
//! An inventory is the set of regular files under a root, keyed by their
//! path relative to that root. It is rebuilt from scratch on every tick.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mirror_fs::RelativePath;
use walkdir::WalkDir;

/// A regular file found during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the inventory root
    pub path: RelativePath,
    /// Location on disk
    pub location: PathBuf,
    /// Size in bytes at walk time
    pub size: u64,
}

/// Something below the root the walk could not list or stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableEntry {
    pub path: RelativePath,
    pub message: String,
}

/// Every regular file under a root.
///
/// Directories are structural only. Symlinks, sockets, FIFOs and devices are
/// left out and links are never followed.
#[derive(Debug, Clone)]
pub struct TreeInventory {
    root: PathBuf,
    entries: BTreeMap<RelativePath, FileEntry>,
    unreadable: Vec<UnreadableEntry>,
}

impl TreeInventory {
    /// An inventory with no files, for a root that does not exist yet.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
            unreadable: Vec::new(),
        }
    }

    /// Walk `root` and collect its regular files.
    ///
    /// # Errors
    ///
    /// Fails only when the root itself is missing, is not a directory, or
    /// cannot be listed. Failures further down are recorded as
    /// [`UnreadableEntry`] values and the walk carries on.
    pub fn scan(root: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(root)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        fs::read_dir(root)?;

        let mut inventory = Self::empty(root);

        for result in WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(err.into_io_error().unwrap_or_else(|| {
                            io::Error::other(format!("cannot walk {}", root.display()))
                        }));
                    }
                    inventory.record_unreadable(err.path(), err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(path) = RelativePath::from_root(root, entry.path()) else {
                continue;
            };

            match entry.metadata() {
                Ok(metadata) => {
                    inventory.entries.insert(
                        path.clone(),
                        FileEntry {
                            path,
                            location: entry.into_path(),
                            size: metadata.len(),
                        },
                    );
                }
                Err(err) => {
                    inventory.unreadable.push(UnreadableEntry {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            files = inventory.entries.len(),
            unreadable = inventory.unreadable.len(),
            "scanned tree"
        );

        Ok(inventory)
    }

    fn record_unreadable(&mut self, location: Option<&Path>, message: String) {
        match location.and_then(|p| RelativePath::from_root(&self.root, p)) {
            Some(path) => self.unreadable.push(UnreadableEntry { path, message }),
            None => tracing::warn!(root = %self.root.display(), %message, "walk error without a path"),
        }
    }

    /// The directory this inventory was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &RelativePath) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths the walk could not read.
    pub fn unreadable(&self) -> &[UnreadableEntry] {
        &self.unreadable
    }

    /// True if `path` is, or lies beneath, something the walk could not read.
    ///
    /// The inventory knows nothing about such paths, so their absence here
    /// says nothing about their absence on disk.
    pub fn is_shadowed(&self, path: &RelativePath) -> bool {
        self.unreadable.iter().any(|u| path.starts_with(&u.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn key(s: &str) -> RelativePath {
        RelativePath::new(s).unwrap()
    }

    #[test]
    fn scan_collects_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/dir")).unwrap();
        fs::write(dir.path().join("root.txt"), "root").unwrap();
        fs::write(dir.path().join("sub/nested.txt"), "nested").unwrap();
        fs::write(dir.path().join("sub/dir/deep.txt"), "deep!").unwrap();

        let inventory = TreeInventory::scan(dir.path()).unwrap();

        let paths: Vec<String> = inventory.entries().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["root.txt", "sub/dir/deep.txt", "sub/nested.txt"]);
        assert_eq!(inventory.get(&key("sub/dir/deep.txt")).unwrap().size, 5);
        assert!(inventory.unreadable().is_empty());
    }

    #[test]
    fn scan_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty/nested")).unwrap();

        let inventory = TreeInventory::scan(dir.path()).unwrap();
        assert!(inventory.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn scan_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let inventory = TreeInventory::scan(dir.path()).unwrap();

        assert_eq!(inventory.len(), 1);
        assert!(inventory.contains(&key("real.txt")));
    }

    #[test]
    fn scan_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = TreeInventory::scan(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn scan_file_root_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(TreeInventory::scan(&file).is_err());
    }

    #[test]
    fn shadowing_is_segment_aware() {
        let mut inventory = TreeInventory::empty("root");
        inventory.unreadable.push(UnreadableEntry {
            path: key("locked"),
            message: "permission denied".into(),
        });

        assert!(inventory.is_shadowed(&key("locked")));
        assert!(inventory.is_shadowed(&key("locked/inner.txt")));
        assert!(!inventory.is_shadowed(&key("lockedout.txt")));
    }
}
