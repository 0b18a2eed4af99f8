//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Bookmark-Audit database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scans
CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    total INTEGER NOT NULL DEFAULT 0
);

-- Dead bookmarks found by each scan
CREATE TABLE IF NOT EXISTS invalid_bookmarks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER NOT NULL REFERENCES scans(id),
    bookmark_id TEXT NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    status_code INTEGER,
    error_kind TEXT NOT NULL,
    error_message TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    history TEXT NOT NULL,
    checked_at TEXT NOT NULL,
    UNIQUE(scan_id, bookmark_id)
);

CREATE INDEX IF NOT EXISTS idx_invalid_scan ON invalid_bookmarks(scan_id);
CREATE INDEX IF NOT EXISTS idx_invalid_kind ON invalid_bookmarks(error_kind);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
