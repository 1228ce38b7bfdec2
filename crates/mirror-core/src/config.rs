//! Mirror configuration
//!
//! Everything the command line can set can also come from a config file.
//! Fields left out fall back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_fs::{ConfigStore, RobustnessConfig};
use serde::Deserialize;

use crate::{Error, Result, SyncOptions};

/// Settings for a mirror pair and its schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Authoritative tree
    pub source: Option<PathBuf>,
    /// Tree kept in sync with `source`
    pub replica: Option<PathBuf>,
    /// Seconds between ticks
    pub interval_secs: u64,
    /// Log file, appended to
    pub log_file: PathBuf,
    pub prune_empty_dirs: bool,
    pub parallel: bool,
    pub lock_timeout_ms: u64,
    pub fsync: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            source: None,
            replica: None,
            interval_secs: 60,
            log_file: PathBuf::from("sync.log"),
            prune_empty_dirs: false,
            parallel: true,
            lock_timeout_ms: 5000,
            fsync: true,
        }
    }
}

impl MirrorConfig {
    /// Load from a `.toml`, `.json`, `.yaml` or `.yml` file and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = ConfigStore::new().load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::InvalidConfig {
                message: "interval_secs must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Synchronizer options for a real (not dry) run.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: false,
            parallel: self.parallel,
            prune_empty_dirs: self.prune_empty_dirs,
            robustness: RobustnessConfig {
                lock_timeout: Duration::from_millis(self.lock_timeout_ms),
                enable_fsync: self.fsync,
            },
        }
    }
}
