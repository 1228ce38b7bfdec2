//! [`TestTree`] fixture for source and replica trees.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::TempDir;
use walkdir::WalkDir;

/// A temporary directory tree with helpers for setup and assertion.
///
/// Paths passed to the helpers are relative to the tree root and use
/// forward slashes.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestTree;
///
/// let source = TestTree::new();
/// source.write("dir/c.txt", "content");
/// assert_eq!(source.read("dir/c.txt"), "content");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("TestTree::new: failed to create temp dir"),
        }
    }

    /// Root of the tree.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute location of `rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        rel.split('/').fold(self.root().to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        self
    }

    /// Create the directory `rel` and its parents.
    pub fn mkdir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.path(rel)).unwrap();
        self
    }

    /// Read `rel` as UTF-8.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Modification time of `rel`.
    pub fn modified(&self, rel: &str) -> SystemTime {
        fs::metadata(self.path(rel)).unwrap().modified().unwrap()
    }

    /// Inode number of `rel`, to detect replacement.
    #[cfg(unix)]
    pub fn inode(&self, rel: &str) -> u64 {
        use std::os::unix::fs::MetadataExt;
        fs::metadata(self.path(rel)).unwrap().ino()
    }

    /// Every regular file in the tree with its bytes, keyed by slash path.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(self.root())
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e
                    .path()
                    .strip_prefix(self.root())
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    /// Slash paths of every regular file, sorted.
    pub fn files(&self) -> Vec<String> {
        self.snapshot().into_keys().collect()
    }

    /// Assert that `other` holds exactly the same files with the same bytes.
    ///
    /// # Panics
    /// Panics with both file lists if the trees differ.
    pub fn assert_mirrors(&self, other: &TestTree) {
        let ours = self.snapshot();
        let theirs = other.snapshot();
        assert!(
            ours == theirs,
            "Trees differ:\n  {}: {:?}\n  {}: {:?}",
            self.root().display(),
            ours.keys().collect::<Vec<_>>(),
            other.root().display(),
            theirs.keys().collect::<Vec<_>>()
        );
    }
}
