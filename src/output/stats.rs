//! Console rendering of scan statistics
//!
//! This module prints stored scan results and domain previews to stdout.

use crate::bookmarks::DomainGroup;
use crate::output::ScanSummary;

/// Prints statistics of a scan to stdout
pub fn print_statistics(summary: &ScanSummary) {
    println!("=== Scan Statistics ===\n");

    println!("Scan {} ({})", summary.scan.id, summary.scan.status.to_db_string());
    println!("  Started: {}", summary.scan.started_at);
    if let Some(finished) = &summary.scan.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  {}", summary.summary_line());
    println!("  Invalid rate: {:.1}%", summary.invalid_rate());
    println!();

    if summary.invalid.is_empty() {
        return;
    }

    println!("Failures by Kind:");
    for (kind, count) in summary.kinds_by_count() {
        println!("  {}: {}", kind, count);
    }
    println!();

    println!("Dead Bookmarks:");
    for entry in &summary.invalid {
        println!(
            "  [{}] {} - {} ({}: {}, {} attempts)",
            entry.bookmark_id,
            entry.title,
            entry.url,
            entry.status_label(),
            entry.error_message,
            entry.attempts
        );
    }
}

/// Prints bookmarks grouped by domain
pub fn print_domain_preview(groups: &[DomainGroup]) {
    println!("=== Bookmarks by Domain ===\n");

    let total: usize = groups.iter().map(|g| g.count()).sum();
    println!("{} bookmarks across {} domains\n", total, groups.len());

    for group in groups {
        println!("{} ({})", group.domain, group.count());
        for bookmark in &group.bookmarks {
            println!("  - {} <{}>", bookmark.title, bookmark.url);
        }
    }
}
