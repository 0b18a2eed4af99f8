//! Bookmark source handling
//!
//! This module reads a Chromium-style `Bookmarks` JSON file, flattens the folder
//! hierarchy into the records the checker probes, and groups them by domain.

mod domain;
mod tree;

pub use domain::{extract_domain, group_by_domain, DomainGroup};
pub use tree::{flatten, load_bookmarks, BookmarkFile, BookmarkNode, BookmarkRoots};

use serde::{Deserialize, Serialize};

/// Title used when a bookmark has an empty name
pub const UNTITLED: &str = "(Untitled)";

/// One URL-bearing bookmark to be probed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTarget {
    /// Opaque bookmark identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// The bookmarked URL
    pub url: String,
}

impl CheckTarget {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Returns true if the URL uses the http or https scheme
///
/// The check is a case-insensitive prefix match, so `HTTPS://example.com` passes
/// while `ftp://`, `chrome://` and `javascript:` bookmarks do not.
///
/// # Examples
///
/// ```
/// use bookmark_audit::bookmarks::is_http_url;
///
/// assert!(is_http_url("https://example.com"));
/// assert!(is_http_url("HTTP://example.com"));
/// assert!(!is_http_url("chrome://settings"));
/// ```
pub fn is_http_url(url: &str) -> bool {
    let lower = url.get(..6).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:")
}

/// Keeps only the bookmarks the checker can probe
pub fn check_targets(entries: Vec<CheckTarget>) -> Vec<CheckTarget> {
    entries
        .into_iter()
        .filter(|entry| is_http_url(&entry.url))
        .collect()
}
