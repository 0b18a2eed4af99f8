use crate::bookmarks::{CheckTarget, UNTITLED};
use crate::AuditError;
use serde::Deserialize;
use std::path::Path;

/// Top level of a Chromium `Bookmarks` file
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkFile {
    pub roots: BookmarkRoots,
}

/// The fixed root folders of a bookmark file
///
/// Fields are visited in declaration order when flattening.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarkRoots {
    #[serde(default)]
    pub bookmark_bar: Option<BookmarkNode>,
    #[serde(default)]
    pub other: Option<BookmarkNode>,
    #[serde(default)]
    pub synced: Option<BookmarkNode>,
}

/// A folder or bookmark in the tree
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<BookmarkNode>,
}

/// Reads and parses a bookmark file
///
/// # Arguments
///
/// * `path` - Path to a Chromium-style `Bookmarks` JSON file
///
/// # Returns
///
/// * `Ok(BookmarkFile)` - The parsed tree
/// * `Err(AuditError)` - The file could not be read or is not a bookmark file
pub fn load_bookmarks(path: &Path) -> Result<BookmarkFile, AuditError> {
    let content = std::fs::read_to_string(path)?;
    let file: BookmarkFile = serde_json::from_str(&content).map_err(|e| {
        AuditError::Bookmarks(format!("{} is not a bookmark file: {}", path.display(), e))
    })?;
    Ok(file)
}

/// Flattens the tree depth-first into every node that carries a URL
///
/// Folders are descended but never emitted. Nodes keep their tree order, which is
/// also the order results are reported in.
pub fn flatten(file: &BookmarkFile) -> Vec<CheckTarget> {
    let mut result = Vec::new();
    let roots = [&file.roots.bookmark_bar, &file.roots.other, &file.roots.synced];
    for root in roots.into_iter().flatten() {
        collect(root, &mut result);
    }
    result
}

fn collect(node: &BookmarkNode, result: &mut Vec<CheckTarget>) {
    if let Some(url) = &node.url {
        let title = if node.name.is_empty() {
            UNTITLED.to_string()
        } else {
            node.name.clone()
        };
        result.push(CheckTarget::new(node.id.clone(), title, url.clone()));
    }
    for child in &node.children {
        collect(child, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "checksum": "abc",
        "roots": {
            "bookmark_bar": {
                "id": "1", "name": "Bookmarks bar", "type": "folder",
                "children": [
                    { "id": "10", "name": "Rust", "type": "url", "url": "https://www.rust-lang.org/" },
                    { "id": "11", "name": "Tools", "type": "folder", "children": [
                        { "id": "12", "name": "", "type": "url", "url": "https://crates.io/" },
                        { "id": "13", "name": "Settings", "type": "url", "url": "chrome://settings" }
                    ]}
                ]
            },
            "other": {
                "id": "2", "name": "Other bookmarks", "type": "folder",
                "children": [
                    { "id": "20", "name": "Docs", "type": "url", "url": "http://docs.rs/" }
                ]
            },
            "synced": { "id": "3", "name": "Mobile bookmarks", "type": "folder", "children": [] }
        },
        "version": 1
    }"#;

    #[test]
    fn test_flatten_depth_first() {
        let file: BookmarkFile = serde_json::from_str(SAMPLE).unwrap();
        let entries = flatten(&file);

        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "12", "13", "20"]);
    }

    #[test]
    fn test_flatten_fills_untitled() {
        let file: BookmarkFile = serde_json::from_str(SAMPLE).unwrap();
        let entries = flatten(&file);

        let crates = entries.iter().find(|e| e.id == "12").unwrap();
        assert_eq!(crates.title, UNTITLED);
    }

    #[test]
    fn test_missing_roots_are_skipped() {
        let file: BookmarkFile = serde_json::from_str(r#"{ "roots": {} }"#).unwrap();
        assert!(flatten(&file).is_empty());
    }

    #[test]
    fn test_load_bookmarks_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let loaded = load_bookmarks(file.path()).unwrap();
        assert_eq!(flatten(&loaded).len(), 4);
    }

    #[test]
    fn test_load_bookmarks_rejects_garbage() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2, 3]").unwrap();
        file.flush().unwrap();

        let result = load_bookmarks(file.path());
        assert!(matches!(result, Err(AuditError::Bookmarks(_))));
    }
}
