//! Markdown report generation
//!
//! This module renders the dead bookmarks of a scan as a markdown document,
//! grouped by failure kind.

use crate::checker::ErrorKind;
use crate::output::ScanSummary;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a scan summary
///
/// # Arguments
///
/// * `summary` - The scan summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(std::io::Error)` - Failed to write the file
pub fn generate_markdown_summary(summary: &ScanSummary, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a scan summary as markdown
pub fn format_markdown_summary(summary: &ScanSummary) -> String {
    let mut md = String::new();

    md.push_str("# Bookmark Audit Report\n\n");

    // Scan metadata
    md.push_str("## Scan Information\n\n");
    md.push_str(&format!("- **Scan ID**: {}\n", summary.scan.id));
    md.push_str(&format!("- **Started**: {}\n", summary.scan.started_at));
    if let Some(finished) = &summary.scan.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    md.push_str(&format!(
        "- **Status**: {}\n",
        summary.scan.status.to_db_string()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n", summary.scan.config_hash));
    md.push_str(&format!("- **Result**: {}\n", summary.summary_line()));
    md.push_str(&format!(
        "- **Invalid Rate**: {:.2}%\n\n",
        summary.invalid_rate()
    ));

    if summary.invalid.is_empty() {
        md.push_str("No dead bookmarks found.\n");
        return md;
    }

    md.push_str("## Failures by Kind\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    for (kind, count) in summary.kinds_by_count() {
        md.push_str(&format!("| {} | {} |\n", kind, count));
    }
    md.push('\n');

    for kind in ErrorKind::failure_kinds() {
        let entries: Vec<_> = summary
            .invalid
            .iter()
            .filter(|i| i.error_kind == kind)
            .collect();
        if entries.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} ({})\n\n", kind_heading(kind), entries.len()));
        md.push_str("| Title | URL | Status | Attempts | Error |\n");
        md.push_str("|-------|-----|--------|----------|-------|\n");
        for entry in entries {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                escape_cell(&entry.title),
                escape_cell(&entry.url),
                entry.status_label(),
                entry.attempts,
                escape_cell(&entry.error_message)
            ));
        }
        md.push('\n');
    }

    md
}

fn kind_heading(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Http => "HTTP Errors",
        ErrorKind::Timeout => "Timeouts",
        ErrorKind::Cors => "Cross-Origin Blocks",
        ErrorKind::Network => "Network Errors",
        ErrorKind::Unknown | ErrorKind::None => "Other Failures",
    }
}

/// Keeps table cells on one row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_summary;
    use tempfile::NamedTempFile;

    #[test]
    fn test_markdown_sections() {
        let md = format_markdown_summary(&sample_summary());

        assert!(md.starts_with("# Bookmark Audit Report"));
        assert!(md.contains("- **Result**: 2 invalid out of 8 scanned."));
        assert!(md.contains("## HTTP Errors (1)"));
        assert!(md.contains("| Old blog | https://old.example/blog | 404 | 3 | 404 Not Found |"));
        assert!(md.contains("## Timeouts (1)"));
        assert!(!md.contains("## Network Errors"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let md = format_markdown_summary(&sample_summary());
        assert!(md.contains("Slow \\| site"));
    }

    #[test]
    fn test_markdown_without_failures() {
        let mut summary = sample_summary();
        summary.invalid.clear();
        summary.invalid_by_kind.clear();

        let md = format_markdown_summary(&summary);
        assert!(md.contains("No dead bookmarks found."));
        assert!(!md.contains("## Failures by Kind"));
    }

    #[test]
    fn test_generate_writes_file() {
        let file = NamedTempFile::new().unwrap();
        generate_markdown_summary(&sample_summary(), file.path()).unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, format_markdown_summary(&sample_summary()));
    }
}
