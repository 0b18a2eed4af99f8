//! Configuration module for Bookmark-Audit
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use bookmark_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Checking with concurrency: {}", config.checker.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CheckerConfig, Config, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
