//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::bookmarks::CheckTarget;
use crate::checker::{Attempt, CheckOutcome, ErrorKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{InvalidBookmark, RetryEffect, ScanRecord, ScanStatus};
use crate::AuditError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const SCAN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, total";

const INVALID_COLUMNS: &str =
    "bookmark_id, title, url, status_code, error_kind, error_message, attempts, history";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(AuditError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn scan_from_row(row: &Row<'_>) -> rusqlite::Result<ScanRecord> {
    Ok(ScanRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: ScanStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(ScanStatus::Failed),
        total: row.get(5)?,
    })
}

/// Raw row; history is decoded after the query so JSON errors surface properly
struct InvalidRow {
    bookmark: InvalidBookmark,
    history_json: String,
}

fn invalid_from_row(row: &Row<'_>) -> rusqlite::Result<InvalidRow> {
    Ok(InvalidRow {
        bookmark: InvalidBookmark {
            bookmark_id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            http_status: row.get(3)?,
            error_kind: ErrorKind::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(ErrorKind::Unknown),
            error_message: row.get(5)?,
            attempts: row.get(6)?,
            history: Vec::new(),
        },
        history_json: row.get(7)?,
    })
}

impl SqliteStorage {
    fn upsert_invalid(&mut self, scan_id: i64, invalid: &InvalidBookmark) -> StorageResult<()> {
        let history = serde_json::to_string(&invalid.history)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO invalid_bookmarks
             (scan_id, bookmark_id, title, url, status_code, error_kind, error_message,
              attempts, history, checked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(scan_id, bookmark_id) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                status_code = excluded.status_code,
                error_kind = excluded.error_kind,
                error_message = excluded.error_message,
                attempts = excluded.attempts,
                history = excluded.history,
                checked_at = excluded.checked_at",
            params![
                scan_id,
                invalid.bookmark_id,
                invalid.title,
                invalid.url,
                invalid.http_status,
                invalid.error_kind.to_db_string(),
                invalid.error_message,
                invalid.attempts,
                history,
                now
            ],
        )?;
        Ok(())
    }

    fn is_listed(&self, scan_id: i64, bookmark_id: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM invalid_bookmarks WHERE scan_id = ?1 AND bookmark_id = ?2",
                params![scan_id, bookmark_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl Storage for SqliteStorage {
    // ===== Scan Management =====

    fn create_scan(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scans (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, ScanStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_scan(&self, scan_id: i64) -> StorageResult<ScanRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM scans WHERE id = ?1", SCAN_COLUMNS),
                params![scan_id],
                scan_from_row,
            )
            .optional()?
            .ok_or(StorageError::ScanNotFound(scan_id))
    }

    fn latest_scan(&self) -> StorageResult<Option<ScanRecord>> {
        let scan = self
            .conn
            .query_row(
                &format!("SELECT {} FROM scans ORDER BY id DESC LIMIT 1", SCAN_COLUMNS),
                [],
                scan_from_row,
            )
            .optional()?;
        Ok(scan)
    }

    fn finish_scan(&mut self, scan_id: i64, status: ScanStatus, total: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE scans SET status = ?1, finished_at = ?2, total = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, total, scan_id],
        )?;
        if updated == 0 {
            return Err(StorageError::ScanNotFound(scan_id));
        }
        Ok(())
    }

    // ===== Invalid Bookmarks =====

    fn record_invalid(&mut self, scan_id: i64, invalid: &InvalidBookmark) -> StorageResult<()> {
        self.upsert_invalid(scan_id, invalid)
    }

    fn load_invalid(&self, scan_id: i64) -> StorageResult<Vec<InvalidBookmark>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invalid_bookmarks WHERE scan_id = ?1 ORDER BY id",
            INVALID_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![scan_id], invalid_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| {
                let history: Vec<Attempt> = serde_json::from_str(&row.history_json)?;
                Ok(InvalidBookmark {
                    history,
                    ..row.bookmark
                })
            })
            .collect()
    }

    fn apply_retry(
        &mut self,
        scan_id: i64,
        target: &CheckTarget,
        outcome: &CheckOutcome,
    ) -> StorageResult<RetryEffect> {
        if !self.is_listed(scan_id, &target.id)? {
            return Ok(RetryEffect::NotListed);
        }

        if outcome.succeeded {
            self.conn.execute(
                "DELETE FROM invalid_bookmarks WHERE scan_id = ?1 AND bookmark_id = ?2",
                params![scan_id, target.id],
            )?;
            return Ok(RetryEffect::Removed);
        }

        self.upsert_invalid(scan_id, &InvalidBookmark::from_outcome(target, outcome))?;
        Ok(RetryEffect::Updated)
    }

    fn remove_invalid(&mut self, scan_id: i64, bookmark_ids: &[String]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare(
                "DELETE FROM invalid_bookmarks WHERE scan_id = ?1 AND bookmark_id = ?2",
            )?;
            for id in bookmark_ids {
                removed += stmt.execute(params![scan_id, id])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    // ===== Statistics =====

    fn count_invalid_by_kind(&self, scan_id: i64) -> StorageResult<HashMap<ErrorKind, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT error_kind, COUNT(*) FROM invalid_bookmarks WHERE scan_id = ?1 GROUP BY error_kind",
        )?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map(params![scan_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (kind, count) = row?;
            let kind = ErrorKind::from_db_string(&kind).unwrap_or(ErrorKind::Unknown);
            *counts.entry(kind).or_insert(0) += count;
        }

        Ok(counts)
    }
}
