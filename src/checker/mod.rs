//! Checker module: the concurrent probing engine
//!
//! This module contains the liveness-checking core:
//! - Failure classification for transport errors
//! - The network transport seam and its reqwest implementation
//! - Per-URL probing with retry and backoff
//! - A bounded worker pool with progress events and cancellation
//! - The `Auditor` front end that ties them together

mod auditor;
mod classify;
mod prober;
mod scheduler;
mod transport;

pub use auditor::{Auditor, ProbeResult, ScanEvent, ScanReport, ScanStream};
pub use classify::{
    classify, Classified, ErrorKind, TransportError, FALLBACK_MESSAGE, TIMEOUT_MESSAGE,
};
pub use prober::{Attempt, CheckOutcome, Prober, RetryPolicy};
pub use scheduler::{run_bounded, CancelSignal, Progress, RunReport, TaskResult};
pub use transport::{
    build_http_client, HttpTransport, RequestMethod, Transport, TransportResponse,
};
