//! Storage module for persisting scan results
//!
//! This module keeps the outcome of the most recent scans so that dead bookmarks
//! can be reviewed, re-checked and forgotten later:
//! - SQLite database initialization and schema management
//! - Scan run tracking (start, finish, cancellation)
//! - The invalid-bookmark list of each scan, with full attempt history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::bookmarks::CheckTarget;
use crate::checker::{Attempt, CheckOutcome, ErrorKind};
use crate::AuditError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(AuditError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, AuditError> {
    SqliteStorage::new(path)
}

/// Represents a scan in the database
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: ScanStatus,
    pub total: u64,
}

/// Status of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ScanStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A bookmark that failed its liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBookmark {
    pub bookmark_id: String,
    pub title: String,
    pub url: String,
    pub http_status: Option<u16>,
    pub error_kind: ErrorKind,
    pub error_message: String,
    pub attempts: u32,
    pub history: Vec<Attempt>,
}

impl InvalidBookmark {
    pub fn from_outcome(target: &CheckTarget, outcome: &CheckOutcome) -> Self {
        Self {
            bookmark_id: target.id.clone(),
            title: target.title.clone(),
            url: target.url.clone(),
            http_status: outcome.http_status,
            error_kind: outcome.error_kind,
            error_message: outcome
                .error_message
                .clone()
                .unwrap_or_else(|| crate::checker::FALLBACK_MESSAGE.to_string()),
            attempts: outcome.attempt_count,
            history: outcome.history.clone(),
        }
    }

    /// Status column for reports: the HTTP status, or `error` when none
    pub fn status_label(&self) -> String {
        match self.http_status {
            Some(status) => status.to_string(),
            None => "error".to_string(),
        }
    }
}

/// What a re-check did to the stored invalid list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEffect {
    /// The bookmark is alive now and was removed from the list
    Removed,

    /// The bookmark still fails; its entry was refreshed
    Updated,

    /// The bookmark was not in the list; nothing changed
    NotListed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_status_roundtrip() {
        for status in &[
            ScanStatus::Running,
            ScanStatus::Completed,
            ScanStatus::Cancelled,
            ScanStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = ScanStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_scan_status_invalid() {
        assert_eq!(ScanStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_status_label() {
        let target = CheckTarget::new("1", "Gone", "https://gone.example/");
        let mut outcome = CheckOutcome::rejected("boom");
        assert_eq!(
            InvalidBookmark::from_outcome(&target, &outcome).status_label(),
            "error"
        );

        outcome.http_status = Some(410);
        let invalid = InvalidBookmark::from_outcome(&target, &outcome);
        assert_eq!(invalid.status_label(), "410");
        assert_eq!(invalid.error_message, "boom");
        assert_eq!(invalid.attempts, 1);
    }
}
