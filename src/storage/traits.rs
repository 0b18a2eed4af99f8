//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::bookmarks::CheckTarget;
use crate::checker::{CheckOutcome, ErrorKind};
use crate::storage::{InvalidBookmark, RetryEffect, ScanRecord, ScanStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Scan not found: {0}")]
    ScanNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed to keep scan results.
pub trait Storage {
    // ===== Scan Management =====

    /// Creates a new scan in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created scan
    fn create_scan(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a scan by ID
    fn get_scan(&self, scan_id: i64) -> StorageResult<ScanRecord>;

    /// Gets the most recent scan
    fn latest_scan(&self) -> StorageResult<Option<ScanRecord>>;

    /// Marks a scan as finished with its final status and probed total
    fn finish_scan(&mut self, scan_id: i64, status: ScanStatus, total: u64) -> StorageResult<()>;

    // ===== Invalid Bookmarks =====

    /// Records one dead bookmark for a scan
    fn record_invalid(&mut self, scan_id: i64, invalid: &InvalidBookmark) -> StorageResult<()>;

    /// Loads the dead bookmarks of a scan in recording order
    fn load_invalid(&self, scan_id: i64) -> StorageResult<Vec<InvalidBookmark>>;

    /// Applies a single-bookmark re-check to a scan's list
    ///
    /// A successful outcome removes the bookmark; a failed one refreshes its
    /// entry. Bookmarks not in the list are left alone.
    fn apply_retry(
        &mut self,
        scan_id: i64,
        target: &CheckTarget,
        outcome: &CheckOutcome,
    ) -> StorageResult<RetryEffect>;

    /// Drops bookmarks (e.g. after the user deleted them) from a scan's list
    ///
    /// # Returns
    ///
    /// The number of entries removed
    fn remove_invalid(&mut self, scan_id: i64, bookmark_ids: &[String]) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Counts a scan's dead bookmarks by error kind
    fn count_invalid_by_kind(&self, scan_id: i64) -> StorageResult<HashMap<ErrorKind, u64>>;
}
