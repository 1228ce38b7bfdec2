//! Tree Mirror CLI
//!
//! Keeps a replica directory identical to a source directory, once or on an
//! interval.

mod cli;
mod commands;
mod error;
mod logging;
mod schedule;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = Cli::parse().into_settings()?;
    logging::init(&settings.log_file, settings.verbose)?;

    if settings.once {
        return commands::run_once(&settings);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::run_periodic(settings))
}
