//! Single and periodic synchronization runs

use std::sync::Arc;

use colored::Colorize;
use mirror_core::{SyncReport, TreeSynchronizer};

use crate::cli::Settings;
use crate::error::{CliError, Result};
use crate::schedule;

/// Run one pass and log every change it made.
fn tick(settings: &Settings) -> mirror_core::Result<SyncReport> {
    let synchronizer = TreeSynchronizer::new(settings.options);
    let report = synchronizer.sync(&settings.source, &settings.replica)?;
    log_changes(&report);
    Ok(report)
}

fn log_changes(report: &SyncReport) {
    let (copied, deleted) = if report.dry_run {
        ("would copy", "would delete")
    } else {
        ("copied", "deleted")
    };
    for path in &report.deleted {
        tracing::info!(%path, "{deleted}");
    }
    for path in &report.copied {
        tracing::info!(%path, "{copied}");
    }
}

/// Print a report on stdout, as one JSON line or as a colored listing.
fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    for path in &report.deleted {
        println!("   {} {}", "-".red(), path.to_string().cyan());
    }
    for path in &report.copied {
        println!("   {} {}", "+".green(), path.to_string().cyan());
    }
    for error in &report.errors {
        println!(
            "   {} {} ({}): {}",
            "!".yellow(),
            error.path.to_string().cyan(),
            error.kind.to_string().dimmed(),
            error.message
        );
    }

    let status = if !report.is_clean() {
        "INCOMPLETE".yellow().bold()
    } else if report.dry_run {
        "DRY RUN".blue().bold()
    } else {
        "OK".green().bold()
    };
    println!("{} {}", status, report.summary());

    Ok(())
}

/// Run a single pass. Any per-file error makes the run fail.
pub fn run_once(settings: &Settings) -> Result<()> {
    if !settings.json {
        println!(
            "{} Mirroring {} -> {}",
            "=>".blue().bold(),
            settings.source.display(),
            settings.replica.display()
        );
    }

    let report = tick(settings)?;
    print_report(&report, settings.json)?;

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::Incomplete {
            errors: report.errors.len(),
        })
    }
}

fn periodic_pass(settings: &Settings, pass: u64) {
    let _span = tracing::info_span!("pass", pass).entered();
    match tick(settings) {
        Ok(report) => {
            if settings.json
                && let Err(err) = print_report(&report, true)
            {
                tracing::warn!(error = %err, "could not print report");
            }
        }
        Err(err) => tracing::error!(error = %err, "pass failed, retrying at the next interval"),
    }
}

/// Run passes every `settings.interval` until interrupted.
///
/// A pass that fails outright is logged and the loop carries on.
pub async fn run_periodic(settings: Settings) -> Result<()> {
    tracing::info!(
        source = %settings.source.display(),
        replica = %settings.replica.display(),
        interval_secs = settings.interval.as_secs(),
        "starting periodic sync"
    );

    let settings = Arc::new(settings);
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("interrupted, stopping"),
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for interrupts");
                std::future::pending::<()>().await;
            }
        }
    };

    let passes = schedule::run_periodic(
        settings.interval,
        |pass| {
            let settings = Arc::clone(&settings);
            async move {
                let handle = tokio::task::spawn_blocking(move || periodic_pass(&settings, pass));
                if let Err(err) = handle.await {
                    tracing::error!(error = %err, "sync pass panicked");
                }
            }
        },
        shutdown,
    )
    .await;

    tracing::info!(passes, "stopped");
    Ok(())
}
