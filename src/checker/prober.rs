//! Single-URL liveness probe with retry and backoff
//!
//! Each attempt sends a HEAD request (falling back to GET when the server
//! refuses HEAD), bounded by a deadline. Failed attempts are retried on a fixed
//! backoff schedule and every attempt is kept in the outcome's history.

use crate::checker::classify::{classify, ErrorKind, TransportError, FALLBACK_MESSAGE};
use crate::checker::transport::{RequestMethod, Transport, TransportResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Statuses for which servers often reject HEAD but answer GET
const HEAD_REJECTED: [u16; 3] = [401, 403, 405];

/// Attempt budget and the delays between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay after attempt `i + 1` fails; the last entry repeats if the
    /// budget is longer than the schedule
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: vec![Duration::from_millis(1000), Duration::from_millis(2000)],
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the attempt with zero-based index `attempt` failed
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.backoff
            .get(attempt)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// One HEAD/GET round trip within a probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub succeeded: bool,
    pub http_status: Option<u16>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
}

impl Attempt {
    fn success(status: u16) -> Self {
        Self {
            succeeded: true,
            http_status: Some(status),
            error_kind: None,
            error_message: None,
        }
    }

    fn http_failure(response: &TransportResponse) -> Self {
        let message = match response.reason.as_deref() {
            Some(reason) if !reason.is_empty() => format!("{} {}", response.status, reason),
            _ => format!("HTTP {}", response.status),
        };
        Self {
            succeeded: false,
            http_status: Some(response.status),
            error_kind: Some(ErrorKind::Http),
            error_message: Some(message),
        }
    }

    fn transport_failure(error: &TransportError) -> Self {
        let classified = classify(error);
        Self {
            succeeded: false,
            http_status: None,
            error_kind: Some(classified.kind),
            error_message: Some(classified.message),
        }
    }
}

/// Final liveness verdict for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub succeeded: bool,
    pub http_status: Option<u16>,
    pub error_kind: ErrorKind,
    pub error_message: Option<String>,
    pub attempt_count: u32,
    pub history: Vec<Attempt>,
}

impl CheckOutcome {
    /// Builds the failed outcome from a non-empty or empty history
    ///
    /// Status, kind and message come from the last attempt.
    fn exhausted(history: Vec<Attempt>) -> Self {
        let last = history.last();
        Self {
            succeeded: false,
            http_status: last.and_then(|a| a.http_status),
            error_kind: last
                .and_then(|a| a.error_kind)
                .unwrap_or(ErrorKind::Unknown),
            error_message: Some(
                last.and_then(|a| a.error_message.clone())
                    .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            ),
            attempt_count: history.len() as u32,
            history,
        }
    }

    /// A failed outcome for a target that could not be probed at all
    pub fn rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            succeeded: false,
            http_status: None,
            error_kind: ErrorKind::Unknown,
            error_message: Some(message.clone()),
            attempt_count: 1,
            history: vec![Attempt {
                succeeded: false,
                http_status: None,
                error_kind: Some(ErrorKind::Unknown),
                error_message: Some(message),
            }],
        }
    }
}

/// Checks URLs for liveness over a [`Transport`]
pub struct Prober<T> {
    transport: Arc<T>,
    policy: RetryPolicy,
}

impl<T> Clone for Prober<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy.clone(),
        }
    }
}

impl<T: Transport> Prober<T> {
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Probes one URL, retrying failed attempts
    ///
    /// The URL must already have passed the http/https scheme check and
    /// `timeout` must be non-zero. The returned outcome always carries at least
    /// one attempt.
    pub async fn probe(&self, url: &str, timeout: Duration) -> CheckOutcome {
        let max_attempts = self.policy.max_attempts.max(1) as usize;
        let mut history = Vec::with_capacity(max_attempts);

        for attempt in 0..max_attempts {
            let result = self.attempt(url, timeout).await;
            tracing::debug!(
                "Attempt {}/{} for {}: status={:?} kind={:?}",
                attempt + 1,
                max_attempts,
                url,
                result.http_status,
                result.error_kind
            );

            if result.succeeded {
                let status = result.http_status;
                history.push(result);
                return CheckOutcome {
                    succeeded: true,
                    http_status: status,
                    error_kind: ErrorKind::None,
                    error_message: None,
                    attempt_count: history.len() as u32,
                    history,
                };
            }
            history.push(result);

            if attempt + 1 < max_attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        let outcome = CheckOutcome::exhausted(history);
        tracing::warn!(
            "{} failed after {} attempts: {} ({})",
            url,
            outcome.attempt_count,
            outcome.error_kind,
            outcome.error_message.as_deref().unwrap_or(FALLBACK_MESSAGE)
        );
        outcome
    }

    /// One deadline-bounded attempt
    ///
    /// When the deadline passes the in-flight request future is dropped, which
    /// cancels the request.
    async fn attempt(&self, url: &str, timeout: Duration) -> Attempt {
        match tokio::time::timeout(timeout, self.exchange(url)).await {
            Ok(Ok(response)) if (200..400).contains(&response.status) => {
                Attempt::success(response.status)
            }
            Ok(Ok(response)) => Attempt::http_failure(&response),
            Ok(Err(error)) => Attempt::transport_failure(&error),
            Err(_) => Attempt::transport_failure(&TransportError::Aborted),
        }
    }

    /// HEAD, then GET if the server rejected HEAD
    async fn exchange(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self.transport.request(RequestMethod::Head, url).await?;
        if HEAD_REJECTED.contains(&response.status) {
            return self.transport.request(RequestMethod::Get, url).await;
        }
        Ok(response)
    }
}
