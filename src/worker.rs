//! Worker thread body shared by core and overflow workers.
//!
//! One loop serves both worker flavors; the only difference is the fetch
//! strategy. Core workers block in `take` and live until shutdown drains the
//! queue. Overflow workers wait at most `keep_alive` in `poll_timeout`; an
//! empty result retires them, shrinking the pool back toward its core size.
//!
//! A worker decrements the shared worker count exactly once, on the way out,
//! and holds no executor lock while fetching or running — the queue's own
//! mutex is the only synchronization on the hot path.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::executor::Shared;
use crate::task::Task;

/// How a worker obtains its next task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FetchStrategy {
    /// Block in `take` until an item arrives or the queue closes. Core
    /// workers.
    Blocking,
    /// Wait at most the keep-alive in `poll_timeout`; an empty result
    /// retires the worker. Overflow workers.
    Timed(Duration),
}

/// Thread body for every pool worker.
///
/// Runs the optional hand-off task first (it bypassed the queue), then
/// drains tasks until the fetch comes back empty or shutdown is observed.
/// Tasks dequeued after shutdown began are discarded unrun; the backlog is
/// not owed execution once the pool is stopping.
pub(crate) fn worker_main(
    shared: Arc<Shared>,
    id: usize,
    strategy: FetchStrategy,
    first_task: Option<Task>,
) {
    if let Some(task) = first_task {
        run_and_settle(&shared, id, task);
    }

    let idled_out = loop {
        let fetched = match strategy {
            FetchStrategy::Blocking => shared.queue.take(),
            FetchStrategy::Timed(keep_alive) => shared.queue.poll_timeout(keep_alive),
        };
        let Some(task) = fetched else {
            // Empty fetch: the queue closed and drained, or the keep-alive
            // expired. Only the latter counts as an idle exit.
            break matches!(strategy, FetchStrategy::Timed(_)) && !shared.queue.is_closed();
        };
        if shared.is_stopping() {
            break false;
        }
        run_and_settle(&shared, id, task);
    };

    if idled_out {
        tracing::debug!(worker = id, "overflow worker idled out");
        shared.metrics.record_overflow_idle_exit();
    }
    shared.release_slot();
}

/// Run one task under the panic guard, then settle it.
fn run_and_settle(shared: &Shared, id: usize, task: Task) {
    if run_guarded(task) {
        tracing::warn!(worker = id, "task panicked; worker continues");
        shared.metrics.record_panicked();
    } else {
        shared.metrics.record_completed();
    }
    shared.settle();
}

/// Execute a task, converting any panic into a `true` return.
///
/// The pool is resilient to task failure: a panicking task must not kill its
/// worker or poison any pool lock, so the unwind stops here.
pub(crate) fn run_guarded(task: Task) -> bool {
    panic::catch_unwind(AssertUnwindSafe(task)).is_err()
}
