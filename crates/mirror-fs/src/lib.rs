//! Filesystem layer for tree-mirror
//!
//! Provides relative-path handling, content fingerprinting, and the
//! write-then-rename copy primitive the synchronizer builds on.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{CHUNK_SIZE, ContentDigest, fingerprint_file, fingerprint_reader};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::RelativePath;
