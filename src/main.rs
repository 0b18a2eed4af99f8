//! Bookmark-Audit main entry point
//!
//! This is the command-line interface for the Bookmark-Audit liveness checker.

use bookmark_audit::bookmarks::{check_targets, flatten, group_by_domain, load_bookmarks};
use bookmark_audit::checker::{Auditor, CheckOutcome};
use bookmark_audit::config::{load_config_with_hash, Config};
use bookmark_audit::output::{
    generate_markdown_summary, generate_summary, print_domain_preview, print_statistics,
    summary_line,
};
use bookmark_audit::storage::{
    open_storage, InvalidBookmark, RetryEffect, ScanStatus, SqliteStorage, Storage,
};
use bookmark_audit::CheckTarget;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Bookmark-Audit: find dead bookmarks
///
/// Bookmark-Audit probes every http/https bookmark in a Chromium-style
/// bookmark file with bounded concurrency, retries transient failures, and
/// reports which bookmarks are dead and why.
#[derive(Parser, Debug)]
#[command(name = "bookmark-audit")]
#[command(version)]
#[command(about = "Find dead bookmarks", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Path to the bookmark file (Chromium `Bookmarks` JSON)
    #[arg(value_name = "BOOKMARKS")]
    bookmarks: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Re-check a single bookmark by ID and update the last scan
    #[arg(long, value_name = "ID", conflicts_with_all = ["domains", "stats", "export_summary", "forget"])]
    retry: Option<String>,

    /// Show bookmarks grouped by domain and exit
    #[arg(long, conflicts_with_all = ["stats", "export_summary", "forget"])]
    domains: bool,

    /// Show statistics of the last scan and exit
    #[arg(long, conflicts_with_all = ["export_summary", "forget"])]
    stats: bool,

    /// Write the markdown report of the last scan and exit
    #[arg(long, conflicts_with = "forget")]
    export_summary: bool,

    /// Drop bookmark IDs (e.g. deleted ones) from the last scan
    #[arg(long, value_name = "ID", num_args = 1..)]
    forget: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if !cli.forget.is_empty() {
        handle_forget(&config, &cli.forget)?;
    } else {
        let bookmarks = cli
            .bookmarks
            .as_deref()
            .ok_or("a BOOKMARKS file is required for this mode")?;

        if cli.domains {
            handle_domains(bookmarks)?;
        } else if let Some(id) = &cli.retry {
            handle_retry(&config, bookmarks, id).await?;
        } else {
            handle_scan(config, &config_hash, bookmarks).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookmark_audit=info,warn"),
            1 => EnvFilter::new("bookmark_audit=debug,info"),
            2 => EnvFilter::new("bookmark_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_database(config: &Config) -> Result<SqliteStorage, Box<dyn std::error::Error>> {
    Ok(open_storage(Path::new(&config.output.database_path))?)
}

fn load_targets(path: &Path) -> Result<Vec<CheckTarget>, Box<dyn std::error::Error>> {
    let file = load_bookmarks(path)?;
    Ok(flatten(&file))
}

/// Handles the --domains mode: prints bookmarks grouped by domain
fn handle_domains(bookmarks: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let entries = load_targets(bookmarks)?;
    print_domain_preview(&group_by_domain(&entries));
    Ok(())
}

/// Handles the --stats mode: shows the last scan
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let summary = generate_summary(&storage)?;
    print_statistics(&summary);

    Ok(())
}

/// Handles the --export-summary mode: writes the markdown report
fn handle_export_summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_database(config)?;

    tracing::info!("Loading scan data from database...");
    let summary = generate_summary(&storage)?;
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Report exported to: {}", config.output.summary_path);
    Ok(())
}

/// Handles the --forget mode: drops IDs from the last scan
fn handle_forget(config: &Config, ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_database(config)?;
    let scan = storage.latest_scan()?.ok_or("no scan stored yet")?;

    let removed = storage.remove_invalid(scan.id, ids)?;
    let remaining = storage.load_invalid(scan.id)?.len();
    println!("Removed {} of {} bookmarks from scan {}", removed, ids.len(), scan.id);
    println!("{}", summary_line(remaining, scan.total));

    Ok(())
}

/// Handles the --retry mode: re-checks one bookmark
async fn handle_retry(
    config: &Config,
    bookmarks: &Path,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = load_targets(bookmarks)?;
    let auditor = Auditor::from_config(config)?;
    let timeout = Duration::from_millis(config.checker.timeout_ms);

    // Unknown IDs still go through the auditor, which rejects the empty URL
    let target = entries
        .into_iter()
        .find(|entry| entry.id == id)
        .unwrap_or_else(|| CheckTarget::new(id, "", ""));
    let outcome = auditor.retry_one(&target, timeout).await;
    print_outcome(&target, &outcome);

    let mut storage = open_database(config)?;
    if let Some(scan) = storage.latest_scan()? {
        match storage.apply_retry(scan.id, &target, &outcome)? {
            RetryEffect::Removed => println!("Removed from scan {}", scan.id),
            RetryEffect::Updated => println!("Updated in scan {}", scan.id),
            RetryEffect::NotListed => {}
        }
        let remaining = storage.load_invalid(scan.id)?.len();
        println!("{}", summary_line(remaining, scan.total));
    }

    Ok(())
}

fn print_outcome(target: &CheckTarget, outcome: &CheckOutcome) {
    if outcome.succeeded {
        println!(
            "✓ [{}] {} is alive ({:?}, {} attempts)",
            target.id, target.url, outcome.http_status, outcome.attempt_count
        );
    } else {
        println!(
            "✗ [{}] {} is dead: {} - {} ({} attempts)",
            target.id,
            target.url,
            outcome.error_kind,
            outcome.error_message.as_deref().unwrap_or_default(),
            outcome.attempt_count
        );
    }
}

/// Handles the main scan operation
async fn handle_scan(
    config: Config,
    config_hash: &str,
    bookmarks: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let targets = check_targets(load_targets(bookmarks)?);
    tracing::info!("Loaded {} http/https bookmarks", targets.len());

    let mut storage = open_database(&config)?;
    let scan_id = storage.create_scan(config_hash)?;

    let auditor = Arc::new(Auditor::from_config(&config)?);
    let stream = auditor.run_check(
        targets,
        config.checker.concurrency as usize,
        Duration::from_millis(config.checker.timeout_ms),
    )?;

    // Ctrl-C stops launching new probes; the partial result is still stored
    let cancel_handle = Arc::clone(&auditor);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling scan");
            cancel_handle.cancel();
        }
    });

    let report = stream
        .finish(|progress| {
            if progress.completed % 10 == 0 || progress.completed == progress.total {
                tracing::info!("Progress: {}/{}", progress.completed, progress.total);
            }
        })
        .await;
    interrupt.abort();

    let Some(report) = report else {
        storage.finish_scan(scan_id, ScanStatus::Failed, 0)?;
        return Err("scan ended without a report".into());
    };

    for (target, outcome) in report.dead_links() {
        storage.record_invalid(scan_id, &InvalidBookmark::from_outcome(target, &outcome))?;
    }
    let status = if report.cancelled {
        ScanStatus::Cancelled
    } else {
        ScanStatus::Completed
    };
    storage.finish_scan(scan_id, status, report.total as u64)?;

    let summary = generate_summary(&storage)?;
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    if report.cancelled {
        println!(
            "Scan cancelled: {} of {} bookmarks checked",
            report.completed, report.total
        );
    }
    println!("{}", report.summary_line());
    println!("Report written to: {}", config.output.summary_path);

    Ok(())
}
