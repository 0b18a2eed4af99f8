use crate::bookmarks::{is_http_url, CheckTarget};
use std::collections::HashMap;
use url::Url;

/// Bookmarks sharing one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainGroup {
    pub domain: String,
    pub bookmarks: Vec<CheckTarget>,
}

impl DomainGroup {
    pub fn count(&self) -> usize {
        self.bookmarks.len()
    }
}

/// Extracts the grouping domain from a URL
///
/// The host is lowercased and a leading `www.` is removed, so `www.Example.com`
/// and `example.com` land in the same group.
///
/// # Returns
///
/// * `Some(String)` - The grouping domain
/// * `None` - The URL does not parse or has no host
///
/// # Examples
///
/// ```
/// use bookmark_audit::bookmarks::extract_domain;
///
/// assert_eq!(extract_domain("https://WWW.Example.com/a"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("https://blog.example.com/"), Some("blog.example.com".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => Some(rest.to_string()),
        None => Some(host),
    }
}

/// Groups http/https bookmarks by domain
///
/// Groups are sorted by size (largest first), ties broken by domain name.
/// Bookmarks inside a group are sorted by title. Bookmarks whose URL has no
/// usable host are left out.
pub fn group_by_domain(entries: &[CheckTarget]) -> Vec<DomainGroup> {
    let mut groups: HashMap<String, Vec<CheckTarget>> = HashMap::new();

    for entry in entries {
        if !is_http_url(&entry.url) {
            continue;
        }
        if let Some(domain) = extract_domain(&entry.url) {
            groups.entry(domain).or_default().push(entry.clone());
        }
    }

    let mut result: Vec<DomainGroup> = groups
        .into_iter()
        .map(|(domain, mut bookmarks)| {
            bookmarks.sort_by(|a, b| a.title.cmp(&b.title));
            DomainGroup { domain, bookmarks }
        })
        .collect();

    result.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.domain.cmp(&b.domain)));
    result
}
