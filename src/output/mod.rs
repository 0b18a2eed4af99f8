//! Output module for scan summaries and reports
//!
//! This module handles:
//! - Building a summary of the latest scan from storage
//! - Printing scan statistics and domain previews to stdout
//! - Writing a markdown report of dead bookmarks

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_domain_preview, print_statistics};

use crate::checker::ErrorKind;
use crate::storage::{InvalidBookmark, ScanRecord, Storage};
use crate::AuditError;
use std::collections::HashMap;

/// Summary of one stored scan
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub scan: ScanRecord,
    pub invalid: Vec<InvalidBookmark>,
    pub invalid_by_kind: HashMap<ErrorKind, u64>,
}

impl ScanSummary {
    /// One-line summary, e.g. `3 invalid out of 120 scanned.`
    pub fn summary_line(&self) -> String {
        summary_line(self.invalid.len(), self.scan.total)
    }

    /// Share of probed bookmarks that are dead, in percent
    pub fn invalid_rate(&self) -> f64 {
        if self.scan.total == 0 {
            0.0
        } else {
            (self.invalid.len() as f64 / self.scan.total as f64) * 100.0
        }
    }

    /// Failure kinds with their counts, most frequent first
    pub fn kinds_by_count(&self) -> Vec<(ErrorKind, u64)> {
        let mut kinds: Vec<_> = self
            .invalid_by_kind
            .iter()
            .map(|(kind, count)| (*kind, *count))
            .collect();
        kinds.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_db_string().cmp(b.0.to_db_string())));
        kinds
    }
}

/// Formats the standard one-line scan summary
pub fn summary_line(invalid: usize, total: u64) -> String {
    format!("{} invalid out of {} scanned.", invalid, total)
}

/// Generates a summary of the most recent scan
///
/// # Arguments
///
/// * `storage` - The storage backend containing scan data
///
/// # Returns
///
/// * `Ok(ScanSummary)` - Successfully generated summary
/// * `Err(AuditError)` - No scan stored, or a query failed
pub fn generate_summary(storage: &dyn Storage) -> Result<ScanSummary, AuditError> {
    let scan = storage.latest_scan()?.ok_or(AuditError::NoScans)?;

    let invalid = storage.load_invalid(scan.id)?;
    let invalid_by_kind = storage.count_invalid_by_kind(scan.id)?;

    Ok(ScanSummary {
        scan,
        invalid,
        invalid_by_kind,
    })
}
