//! Front end of the checking engine
//!
//! The [`Auditor`] owns a prober and at most one active run. It exposes the three
//! operations collaborators use: start a streamed scan, cancel it, and re-check a
//! single bookmark.

use crate::bookmarks::{is_http_url, CheckTarget};
use crate::checker::prober::{CheckOutcome, Prober, RetryPolicy};
use crate::checker::scheduler::{run_bounded, CancelSignal, Progress, TaskResult};
use crate::checker::transport::{HttpTransport, Transport};
use crate::config::Config;
use crate::AuditError;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Message for targets that cannot be probed
pub const UNSUPPORTED_TARGET: &str = "Bookmark not found or unsupported URL";

/// Buffered progress events between the pool and the consumer
const EVENT_CAPACITY: usize = 64;

/// Per-item result of a scan
pub type ProbeResult = TaskResult<CheckOutcome>;

/// One message on a scan stream
#[derive(Debug)]
pub enum ScanEvent {
    /// An item settled
    Progress(Progress),

    /// The run resolved; always the last event
    Finished(ScanReport),
}

/// Final report of a scan
#[derive(Debug)]
pub struct ScanReport {
    /// The probed targets, in probe order
    pub targets: Vec<CheckTarget>,

    /// One slot per target; `None` means never attempted
    pub outcomes: Vec<Option<ProbeResult>>,

    /// Number of probed targets
    pub total: usize,

    /// Number of targets that settled
    pub completed: usize,

    /// Whether the scan was cancelled before every target settled
    pub cancelled: bool,
}

impl ScanReport {
    /// Targets whose probe failed, paired with their outcome
    ///
    /// A worker failure is reported as an `unknown` outcome carrying its message.
    /// Unattempted targets are not included.
    pub fn dead_links(&self) -> Vec<(&CheckTarget, CheckOutcome)> {
        self.targets
            .iter()
            .zip(&self.outcomes)
            .filter_map(|(target, slot)| match slot {
                Some(TaskResult::Completed(outcome)) if !outcome.succeeded => {
                    Some((target, outcome.clone()))
                }
                Some(TaskResult::Failed { message }) => {
                    Some((target, CheckOutcome::rejected(message.clone())))
                }
                _ => None,
            })
            .collect()
    }

    /// Targets that were never attempted because of cancellation
    pub fn unattempted(&self) -> usize {
        self.outcomes.iter().filter(|slot| slot.is_none()).count()
    }

    /// One-line summary, e.g. `3 invalid out of 120 scanned.`
    pub fn summary_line(&self) -> String {
        format!(
            "{} invalid out of {} scanned.",
            self.dead_links().len(),
            self.total
        )
    }
}

/// Receiving end of a running scan
#[derive(Debug)]
pub struct ScanStream {
    rx: mpsc::Receiver<ScanEvent>,
}

impl ScanStream {
    /// Next event, or `None` once the stream is exhausted
    pub async fn next(&mut self) -> Option<ScanEvent> {
        self.rx.recv().await
    }

    /// Drains the stream, handing progress to `on_progress`
    ///
    /// Returns `None` only if the run task went away without a report.
    pub async fn finish(mut self, mut on_progress: impl FnMut(Progress)) -> Option<ScanReport> {
        while let Some(event) = self.rx.recv().await {
            match event {
                ScanEvent::Progress(progress) => on_progress(progress),
                ScanEvent::Finished(report) => return Some(report),
            }
        }
        None
    }
}

/// Runs bookmark scans; at most one at a time
pub struct Auditor<T = HttpTransport> {
    prober: Prober<T>,
    active: Arc<Mutex<Option<CancelSignal>>>,
}

impl Auditor<HttpTransport> {
    /// Builds an auditor with a reqwest transport and the default retry policy
    pub fn from_config(config: &Config) -> Result<Self, AuditError> {
        let transport = HttpTransport::from_config(&config.user_agent)?;
        Ok(Self::new(Prober::new(transport)))
    }
}

impl<T: Transport> Auditor<T> {
    pub fn new(prober: Prober<T>) -> Self {
        Self {
            prober,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Builds an auditor around a transport with a custom retry policy
    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self::new(Prober::with_policy(transport, policy))
    }

    /// Whether a scan is currently running
    pub fn is_running(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// Starts a scan over `targets`
    ///
    /// Targets without an http/https URL are dropped before the run. The
    /// returned stream yields a progress event per settled target and then one
    /// [`ScanEvent::Finished`]. The auditor accepts a new scan once the report
    /// has been sent.
    ///
    /// # Errors
    ///
    /// * `AuditError::RunInProgress` - another scan has not finished yet
    pub fn run_check(
        &self,
        targets: Vec<CheckTarget>,
        concurrency: usize,
        timeout: Duration,
    ) -> Result<ScanStream, AuditError> {
        let signal = CancelSignal::new();
        {
            let mut active = self.active.lock().unwrap();
            if active.is_some() {
                return Err(AuditError::RunInProgress);
            }
            *active = Some(signal.clone());
        }

        let targets: Vec<CheckTarget> = targets
            .into_iter()
            .filter(|t| is_http_url(&t.url))
            .collect();
        let timeout = clamp_timeout(timeout);
        let prober = self.prober.clone();
        let active = Arc::clone(&self.active);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);

        tracing::info!(
            "Starting scan of {} bookmarks (concurrency {}, timeout {:?})",
            targets.len(),
            concurrency,
            timeout
        );

        tokio::spawn(async move {
            let (progress_tx, mut progress_rx) = mpsc::channel(EVENT_CAPACITY);
            let forward_tx = events_tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    if forward_tx.send(ScanEvent::Progress(progress)).await.is_err() {
                        break;
                    }
                }
            });

            let report = run_bounded(
                targets.clone(),
                concurrency,
                move |target: CheckTarget| {
                    let prober = prober.clone();
                    async move { Ok::<_, Infallible>(prober.probe(&target.url, timeout).await) }
                },
                Some(progress_tx),
                signal,
            )
            .await;

            // Every progress event is delivered before the report
            if let Err(e) = forwarder.await {
                tracing::error!("Progress forwarder failed: {}", e);
            }

            let report = ScanReport {
                total: targets.len(),
                targets,
                outcomes: report.results,
                completed: report.completed,
                cancelled: report.cancelled,
            };
            tracing::info!(
                "Scan {}: {}",
                if report.cancelled { "cancelled" } else { "finished" },
                report.summary_line()
            );

            active.lock().unwrap().take();
            if events_tx.send(ScanEvent::Finished(report)).await.is_err() {
                tracing::warn!("Scan report dropped: receiver closed");
            }
        });

        Ok(ScanStream { rx: events_rx })
    }

    /// Requests cancellation of the running scan
    ///
    /// Returns false if no scan was running; the request is then discarded and
    /// has no effect on later scans.
    pub fn cancel(&self) -> bool {
        match self.active.lock().unwrap().as_ref() {
            Some(signal) => {
                tracing::info!("Cancelling active scan");
                signal.cancel();
                true
            }
            None => false,
        }
    }

    /// Re-checks one bookmark outside any scan
    ///
    /// The outcome depends only on the current state of the URL, never on
    /// earlier results for the same bookmark.
    pub async fn retry_one(&self, target: &CheckTarget, timeout: Duration) -> CheckOutcome {
        if !is_http_url(&target.url) {
            return CheckOutcome::rejected(UNSUPPORTED_TARGET);
        }
        self.prober.probe(&target.url, clamp_timeout(timeout)).await
    }
}

fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.max(Duration::from_millis(1))
}
