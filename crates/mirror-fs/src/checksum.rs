//! Content fingerprinting
//!
//! A file's identity for synchronization purposes is the MD5 digest of its
//! bytes. Timestamps and other metadata never take part in the comparison.
//! The canonical text form is `md5:<hex>`.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix for the text form of a digest
const PREFIX: &str = "md5:";

/// Chunk size used when streaming a file into the hasher.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// A 128-bit content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    /// Digest of in-memory content.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        Self::finish(hasher)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex without the prefix.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn finish(hasher: Md5) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Fold a byte stream into a digest, reading at most `chunk_size` bytes at a time.
///
/// The result depends only on the bytes produced by `reader`, never on
/// `chunk_size`. A `chunk_size` of zero is treated as one.
pub fn fingerprint_reader<R: Read>(mut reader: R, chunk_size: usize) -> std::io::Result<ContentDigest> {
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(ContentDigest::finish(hasher))
}

/// Compute the digest of a file's contents.
///
/// # Errors
///
/// Returns [`Error::Read`] if the file cannot be opened or a read fails
/// part-way through.
pub fn fingerprint_file(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path).map_err(|e| Error::read(path, e))?;
    fingerprint_reader(file, CHUNK_SIZE).map_err(|e| Error::read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_has_prefix() {
        let digest = ContentDigest::of_bytes(b"hello world");
        assert!(digest.to_string().starts_with("md5:"));
    }

    #[test]
    fn digest_is_deterministic() {
        let a = ContentDigest::of_bytes(b"test");
        let b = ContentDigest::of_bytes(b"test");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_different_digest() {
        let a = ContentDigest::of_bytes(b"aaa");
        let b = ContentDigest::of_bytes(b"bbb");
        assert_ne!(a, b);
    }

    #[test]
    fn digest_known_values() {
        assert_eq!(
            ContentDigest::of_bytes(b"hello").to_string(),
            "md5:5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            ContentDigest::of_bytes(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn reader_digest_ignores_chunk_size() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let expected = ContentDigest::of_bytes(&data);
        for chunk in [0, 1, 7, 4096, CHUNK_SIZE, 1 << 20] {
            let digest = fingerprint_reader(&data[..], chunk).unwrap();
            assert_eq!(digest, expected, "chunk size {chunk}");
        }
    }

    #[test]
    fn file_digest_matches_content_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::write(&path, "hello world").unwrap();

        let from_file = fingerprint_file(&path).unwrap();
        assert_eq!(from_file, ContentDigest::of_bytes(b"hello world"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = fingerprint_file(&dir.path().join("gone.txt")).unwrap_err();
        assert!(err.is_read(), "unexpected error: {err}");
    }
}
