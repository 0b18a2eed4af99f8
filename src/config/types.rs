use serde::Deserialize;

/// Default number of bookmarks probed at once
pub const DEFAULT_CONCURRENCY: u32 = 5;

/// Default per-attempt deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// Main configuration structure for Bookmark-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub checker: CheckerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Probe scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerConfig {
    /// Maximum number of bookmarks probed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Deadline for a single HEAD/GET attempt (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

fn default_concurrency() -> u32 {
    DEFAULT_CONCURRENCY
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name sent in the User-Agent header
    pub name: String,

    /// Version sent in the User-Agent header
    pub version: String,

    /// Optional URL describing the checker
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.name, self.version, url),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database holding the last scan
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown dead-bookmark report
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}
