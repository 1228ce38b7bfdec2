//! CLI argument parsing using clap derive

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mirror_core::{MirrorConfig, SyncOptions};

use crate::error::{CliError, Result};

/// Tree Mirror - Keep a replica directory identical to a source directory
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to mirror from
    pub source: Option<PathBuf>,

    /// Directory to keep in sync with SOURCE
    pub replica: Option<PathBuf>,

    /// Seconds between synchronization passes
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Log file, appended to
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Load settings from a .toml, .json, .yaml or .yml file
    #[arg(short, long, env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Report what would change without modifying the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Print each pass's report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Remove directories emptied by deletions
    #[arg(long)]
    pub prune_empty_dirs: bool,

    /// Digest files sequentially
    #[arg(long)]
    pub no_parallel: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything a run needs, after merging the config file and the arguments.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub interval: Duration,
    pub log_file: PathBuf,
    pub options: SyncOptions,
    pub once: bool,
    pub json: bool,
    pub verbose: bool,
}

impl Cli {
    /// Merge arguments over the config file. Arguments win.
    pub fn into_settings(self) -> Result<Settings> {
        let mut config = match &self.config {
            Some(path) => MirrorConfig::load(path)?,
            None => MirrorConfig::default(),
        };

        if let Some(source) = self.source {
            config.source = Some(source);
        }
        if let Some(replica) = self.replica {
            config.replica = Some(replica);
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(log) = self.log {
            config.log_file = log;
        }
        if self.prune_empty_dirs {
            config.prune_empty_dirs = true;
        }
        if self.no_parallel {
            config.parallel = false;
        }
        config.validate()?;

        let mut options = config.sync_options();
        options.dry_run = self.dry_run;

        let source = config
            .source
            .clone()
            .ok_or_else(|| CliError::user("no source directory given (pass SOURCE or set `source` in the config file)"))?;
        let replica = config
            .replica
            .clone()
            .ok_or_else(|| CliError::user("no replica directory given (pass REPLICA or set `replica` in the config file)"))?;

        Ok(Settings {
            source,
            replica,
            interval: config.interval(),
            log_file: config.log_file,
            options,
            once: self.once,
            json: self.json,
            verbose: self.verbose,
        })
    }
}
