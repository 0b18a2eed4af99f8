//! Bookmark-Audit: a concurrent liveness checker for bookmark collections
//!
//! This crate probes every http/https bookmark with bounded parallelism, retries
//! transient failures with backoff, classifies why dead links failed, and keeps the
//! latest scan so individual bookmarks can be re-checked later.

pub mod bookmarks;
pub mod checker;
pub mod config;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Bookmark-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("A scan is already running")]
    RunInProgress,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Bookmark file error: {0}")]
    Bookmarks(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No scans found in database")]
    NoScans,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Bookmark-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use bookmarks::{extract_domain, is_http_url, CheckTarget};
pub use checker::{Auditor, CheckOutcome, ErrorKind};
pub use config::Config;
