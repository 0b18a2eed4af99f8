//! Failure classification for probe attempts
//!
//! Transport failures arrive as typed [`TransportError`] variants and are mapped to
//! one of a fixed set of [`ErrorKind`]s. HTTP status failures are tagged by the
//! prober directly and never pass through [`classify`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message recorded when an attempt hits its deadline
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Message used when nothing more specific is known
pub const FALLBACK_MESSAGE: &str = "Fetch failed";

/// Why a probe attempt (or a whole probe) failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The server answered with a status outside [200, 400)
    Http,

    /// The attempt deadline elapsed before the server answered
    Timeout,

    /// The failure text looks like a cross-origin rejection
    Cors,

    /// Transport-level failure (DNS, connection refused, TLS, redirect loop)
    Network,

    /// Anything unrecognized
    Unknown,

    /// No failure
    None,
}

impl ErrorKind {
    /// Converts the kind to its stored string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Timeout => "timeout",
            Self::Cors => "cors",
            Self::Network => "network",
            Self::Unknown => "unknown",
            Self::None => "none",
        }
    }

    /// Parses a kind from its stored string representation
    ///
    /// Returns None if the string doesn't match any known kind.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Self::Http),
            "timeout" => Some(Self::Timeout),
            "cors" => Some(Self::Cors),
            "network" => Some(Self::Network),
            "unknown" => Some(Self::Unknown),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Returns all failure kinds (everything except `None`)
    pub fn failure_kinds() -> [Self; 5] {
        [
            Self::Http,
            Self::Timeout,
            Self::Cors,
            Self::Network,
            Self::Unknown,
        ]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// A failure raised by the network layer during one request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request was aborted because its deadline passed
    #[error("request aborted")]
    Aborted,

    /// Generic transport failure (DNS, connect, TLS, redirect handling)
    #[error("{0}")]
    Transport(String),

    /// Any other client-side failure
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Aborted
        } else if e.is_connect() || e.is_request() || e.is_redirect() || e.is_body() {
            Self::Transport(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// A classified failure: its kind plus the message to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: ErrorKind,
    pub message: String,
}

/// Maps a transport failure to an error kind
///
/// Order matters: an aborted request is always a timeout, even when some message
/// mentions CORS. The CORS check is a best-effort substring heuristic; a client
/// outside a browser rarely sees a genuine cross-origin rejection.
pub fn classify(error: &TransportError) -> Classified {
    let message = match error {
        TransportError::Aborted => {
            return Classified {
                kind: ErrorKind::Timeout,
                message: TIMEOUT_MESSAGE.to_string(),
            };
        }
        TransportError::Transport(m) | TransportError::Other(m) => {
            if m.is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                m.clone()
            }
        }
    };

    let kind = if message.to_lowercase().contains("cors") {
        ErrorKind::Cors
    } else if matches!(error, TransportError::Transport(_)) {
        ErrorKind::Network
    } else {
        ErrorKind::Unknown
    };

    Classified { kind, message }
}
