use filetime::FileTime;
use mirror_fs::io::{self, RobustnessConfig};
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn fast_config() -> RobustnessConfig {
    RobustnessConfig {
        lock_timeout: Duration::from_millis(500),
        enable_fsync: false,
    }
}

#[test]
fn test_copy_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source.txt");
    let target = temp.path().join("target.txt");
    fs::write(&source, "hello world").unwrap();

    let copied = io::copy_atomic(&source, &target, fast_config()).unwrap();

    assert_eq!(copied, 11);
    assert_eq!(fs::read_to_string(&target).unwrap(), "hello world");
}

#[test]
fn test_copy_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source.txt");
    let target = temp.path().join("target.txt");
    fs::write(&source, "updated").unwrap();
    fs::write(&target, "original content that is longer").unwrap();

    io::copy_atomic(&source, &target, RobustnessConfig::default()).unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "updated");
}

#[test]
fn test_copy_atomic_creates_missing_parents() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source.txt");
    let target = temp.path().join("a").join("b").join("c").join("file.txt");
    fs::write(&source, "deep content").unwrap();

    io::copy_atomic(&source, &target, fast_config()).unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "deep content");
}

#[test]
fn test_copy_atomic_preserves_mtime() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source.txt");
    let target = temp.path().join("target.txt");
    fs::write(&source, "dated").unwrap();
    let stamp = FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(&source, stamp).unwrap();

    io::copy_atomic(&source, &target, fast_config()).unwrap();

    let copied = FileTime::from_last_modification_time(&fs::metadata(&target).unwrap());
    assert_eq!(copied, stamp);
}

#[test]
fn test_copy_atomic_replaces_directory_at_target() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source.txt");
    let target = temp.path().join("flip");
    fs::write(&source, "now a file").unwrap();
    fs::create_dir_all(target.join("nested")).unwrap();
    fs::write(target.join("nested").join("old.txt"), "old").unwrap();

    io::copy_atomic(&source, &target, fast_config()).unwrap();

    assert!(target.is_file());
    assert_eq!(fs::read_to_string(&target).unwrap(), "now a file");
}

#[test]
fn test_copy_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source.txt");
    let out = temp.path().join("out");
    fs::write(&source, "content").unwrap();

    io::copy_atomic(&source, &out.join("target.txt"), fast_config()).unwrap();

    let leftovers: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "found temp files: {leftovers:?}");
}

#[test]
fn test_copy_atomic_missing_source_is_read_error() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("target.txt");
    fs::write(&target, "keep me").unwrap();

    let err = io::copy_atomic(&temp.path().join("nope"), &target, fast_config()).unwrap_err();

    assert!(err.is_read(), "unexpected error: {err}");
    assert_eq!(fs::read_to_string(&target).unwrap(), "keep me");
}

#[test]
fn test_remove_empty_dirs_stops_at_root_and_non_empty() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("a/b/c")).unwrap();
    fs::write(root.join("a/keep.txt"), "x").unwrap();

    let removed = io::remove_empty_dirs(root, &root.join("a/b/c")).unwrap();

    assert_eq!(removed, 2);
    assert!(!root.join("a/b").exists());
    assert!(root.join("a").is_dir());
}

#[test]
fn test_remove_empty_dirs_never_removes_root() {
    let temp = TempDir::new().unwrap();
    let removed = io::remove_empty_dirs(temp.path(), temp.path()).unwrap();
    assert_eq!(removed, 0);
    assert!(temp.path().is_dir());
}

#[test]
fn test_ensure_dir_rejects_file_in_the_way() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("replica");
    fs::write(&blocker, "i am a file").unwrap();

    assert!(io::ensure_dir(&blocker).is_err());
    assert!(io::ensure_dir(&temp.path().join("x/y/z")).is_ok());
}

#[test]
fn test_copy_atomic_into_nested_target() {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("source.bin");
    source.write_binary(&[0u8, 1, 2, 255]).unwrap();
    let target = temp.child("a/b/c/target.bin");

    io::copy_atomic(source.path(), target.path(), fast_config()).unwrap();

    target.assert(predicate::path::is_file());
    target.assert(&[0u8, 1, 2, 255][..]);
    let siblings: Vec<_> = std::fs::read_dir(temp.child("a/b/c").path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(siblings, vec![std::ffi::OsString::from("target.bin")]);
}

#[test]
fn test_copy_atomic_never_clobbers_sibling_named_like_temp() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("a.txt");
    fs::write(&source, "a").unwrap();
    let out = temp.path().join("out");
    fs::create_dir(&out).unwrap();
    let lookalike = out.join(format!(".a.txt.{}.tmp", std::process::id()));
    fs::write(&lookalike, "real file").unwrap();

    io::copy_atomic(&source, &out.join("a.txt"), fast_config()).unwrap();

    assert_eq!(fs::read_to_string(&lookalike).unwrap(), "real file");
    assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "a");
}
