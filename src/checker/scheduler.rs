//! Bounded worker pool for probing many targets
//!
//! This module handles:
//! - Running a worker over an ordered item list with at most `limit` in flight
//! - Placing results by original index regardless of completion order
//! - Emitting a progress event after every settled item
//! - Cooperative, per-run cancellation

use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;

/// Cancellation signal for one run
///
/// Cloned handles share the same state. A signal is created per run, so a
/// cancel aimed at one run can never leak into the next.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests cancellation; idempotent
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns once the flag is set
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Progress after an item settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// What one worker invocation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult<T> {
    /// The worker returned a value
    Completed(T),

    /// The worker returned an error or panicked
    Failed { message: String },
}

impl<T> TaskResult<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed { .. } => None,
        }
    }
}

/// Result of a whole run
#[derive(Debug)]
pub struct RunReport<T> {
    /// One slot per item, by original index; `None` means never attempted
    pub results: Vec<Option<TaskResult<T>>>,

    /// Number of items that settled before the run resolved
    pub completed: usize,

    /// Whether the run resolved early because of cancellation
    pub cancelled: bool,
}

/// Mutable run state, guarded by one lock
struct RunState<T> {
    next_index: usize,
    in_flight: usize,
    completed: usize,
    results: Vec<Option<TaskResult<T>>>,
    cancelled: bool,
}

struct Shared<I, T, F> {
    items: Vec<I>,
    worker: F,
    state: Mutex<RunState<T>>,
    progress: Option<mpsc::Sender<Progress>>,
    cancel: CancelSignal,
}

/// Runs `worker` over `items` with at most `limit` invocations in flight
///
/// `limit` is clamped to at least 1. A fixed pool of `limit` tasks repeatedly
/// claims the next unclaimed index, runs the worker, records the result and
/// reports progress before claiming again. A worker error or panic becomes a
/// [`TaskResult::Failed`] for that slot and the run carries on.
///
/// Cancellation is checked before every claim. Once the run observes it, it
/// resolves at once with the slots filled so far; in-flight invocations are
/// not awaited and are aborted when the pool is dropped.
///
/// Progress events are sent while the run state is locked, which keeps their
/// counts in order. A full channel stalls the pool until the receiver reads
/// or the run is cancelled.
pub async fn run_bounded<I, T, E, F, Fut>(
    items: Vec<I>,
    limit: usize,
    worker: F,
    progress: Option<mpsc::Sender<Progress>>,
    cancel: CancelSignal,
) -> RunReport<T>
where
    I: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return RunReport {
            results: Vec::new(),
            completed: 0,
            cancelled: false,
        };
    }

    let pool_size = limit.max(1).min(total);
    tracing::debug!("Running {} items with {} workers", total, pool_size);

    let shared = Arc::new(Shared {
        items,
        worker,
        state: Mutex::new(RunState {
            next_index: 0,
            in_flight: 0,
            completed: 0,
            results: (0..total).map(|_| None).collect(),
            cancelled: false,
        }),
        progress,
        cancel,
    });

    let mut pool = JoinSet::new();
    for _ in 0..pool_size {
        pool.spawn(pool_worker::<I, T, E, F, Fut>(Arc::clone(&shared)));
    }

    let cancelled = tokio::select! {
        biased;
        _ = shared.cancel.cancelled() => true,
        _ = drain(&mut pool) => false,
    };

    let mut state = shared.state.lock().await;
    if cancelled {
        state.cancelled = true;
        tracing::info!(
            "Run cancelled after {}/{} items ({} in flight abandoned)",
            state.completed,
            total,
            state.in_flight
        );
    }
    let report = RunReport {
        results: std::mem::take(&mut state.results),
        completed: state.completed,
        cancelled,
    };
    drop(state);
    pool.abort_all();

    report
}

async fn drain(pool: &mut JoinSet<()>) {
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Pool worker ended abnormally: {}", e);
        }
    }
}

/// One pool slot: claim, execute, record, report, repeat
async fn pool_worker<I, T, E, F, Fut>(shared: Arc<Shared<I, T, F>>)
where
    I: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let total = shared.items.len();

    loop {
        let index = {
            let mut state = shared.state.lock().await;
            if state.cancelled || shared.cancel.is_cancelled() || state.next_index >= total {
                return;
            }
            let index = state.next_index;
            state.next_index += 1;
            state.in_flight += 1;
            index
        };

        // Calling the worker sits inside the guard too; it may panic before
        // it hands back a future
        let item = shared.items[index].clone();
        let invocation = async { (shared.worker)(item).await };
        let result = match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(value)) => TaskResult::Completed(value),
            Ok(Err(e)) => TaskResult::Failed {
                message: e.to_string(),
            },
            Err(panic) => TaskResult::Failed {
                message: panic_message(panic.as_ref()),
            },
        };

        let mut state = shared.state.lock().await;
        if state.cancelled {
            // The run already resolved; its results were handed out
            return;
        }
        debug_assert!(state.results[index].is_none(), "slot {index} written twice");
        state.results[index] = Some(result);
        state.in_flight -= 1;
        state.completed += 1;

        if let Some(tx) = &shared.progress {
            let event = Progress {
                completed: state.completed,
                total,
            };
            // A stalled receiver must not hold the lock past a cancel
            tokio::select! {
                sent = tx.send(event) => {
                    if sent.is_err() {
                        tracing::trace!("Progress receiver dropped");
                    }
                }
                _ = shared.cancel.cancelled() => return,
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}
