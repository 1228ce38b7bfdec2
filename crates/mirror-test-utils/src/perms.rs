//! Helpers for tests that revoke permissions to provoke I/O failures.

/// True when the current user is root, which bypasses permission checks.
pub fn is_root() -> bool {
    match std::process::Command::new("id").arg("-u").output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "0",
        Err(_) => false,
    }
}

/// Set unix permission bits on `path`.
#[cfg(unix)]
pub fn set_mode(path: &std::path::Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .unwrap_or_else(|e| panic!("set_mode {:o} on {}: {e}", mode, path.display()));
}

/// Restores a mode when dropped, so tempdir cleanup works even if the test panics.
#[cfg(unix)]
pub struct ModeGuard {
    path: std::path::PathBuf,
    restore: u32,
}

#[cfg(unix)]
impl ModeGuard {
    /// Apply `mode` now and `restore` on drop.
    pub fn new(path: impl Into<std::path::PathBuf>, mode: u32, restore: u32) -> Self {
        let path = path.into();
        set_mode(&path, mode);
        Self { path, restore }
    }
}

#[cfg(unix)]
impl Drop for ModeGuard {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(self.restore));
    }
}
