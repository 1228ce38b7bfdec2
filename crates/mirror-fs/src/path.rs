//! Relative path keys for tree inventories

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Serialize, Serializer};

/// A path relative to a tree root, stored as its segments.
///
/// Two trees are compared by these keys, so the same file in the source and
/// the replica maps to equal values regardless of where the roots live.
/// Displayed with forward slashes on every platform; converted to a native
/// path only when resolved against a root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath {
    segments: Vec<OsString>,
}

impl RelativePath {
    /// Build a key from a path already relative to its root.
    ///
    /// Returns `None` for absolute paths, the empty path, or paths containing
    /// `..`. `.` components are dropped.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let mut segments = Vec::new();
        for component in path.as_ref().components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_os_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Build a key for `path` as seen from `root`.
    pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
        path.strip_prefix(root).ok().and_then(Self::new)
    }

    /// Iterate over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &OsStr> {
        self.segments.iter().map(OsString::as_os_str)
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Resolve against a root to get the on-disk location.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }

    /// The containing directory, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() > 1 {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        } else {
            None
        }
    }

    /// The final segment.
    pub fn file_name(&self) -> &OsStr {
        // Non-empty by construction.
        self.segments
            .last()
            .map(OsString::as_os_str)
            .unwrap_or_default()
    }

    /// Segment-wise prefix test: `a/b` starts with `a` but not with `a/b/c` or `a/` + `bc`.
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Forward-slash rendering. Non-UTF-8 segments are rendered lossily.
    pub fn to_slash_string(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_slash_string())
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_slash_string())
    }
}
