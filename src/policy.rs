//! Rejection policies: what happens to a task the pool cannot admit.
//!
//! A policy runs on the submitting thread, after admission has exhausted the
//! core pool, the backlog, and the overflow cap. It receives the task and a
//! [`PoolHandle`] — a deliberately narrow view of the executor that exposes
//! the queue and the stopping flag but *not* `submit`, so a policy can never
//! re-enter admission and recurse.
//!
//! Policies are stateless values owned by the executor. Pass them by
//! construction (`Builder::policy(DiscardOldest)`); there are no process
//! globals.
//!
//! | Policy          | Not stopping                       | Stopping      |
//! |-----------------|------------------------------------|---------------|
//! | [`Abort`]       | error to the submitter             | same          |
//! | [`Discard`]     | drop silently                      | same          |
//! | [`DiscardOldest`] | drop queue head, enqueue the task | drop silently |
//! | [`CallerRuns`]  | run inline on the submitter        | drop silently |

use crate::error::Rejected;
use crate::metrics::PoolMetrics;
use crate::queue::BlockingQueue;
use crate::task::Task;
use crate::worker::run_guarded;

/// The slice of executor state a rejection policy may touch.
pub struct PoolHandle<'a> {
    pub(crate) queue: &'a dyn BlockingQueue<Task>,
    pub(crate) stopping: bool,
    pub(crate) metrics: &'a PoolMetrics,
}

impl PoolHandle<'_> {
    /// True when the executor has begun shutting down.
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.stopping
    }

    /// The executor's backlog queue.
    ///
    /// Policies may only use the queue API here (`poll`, `offer`, ...); the
    /// queue takes its own lock per call, so there is no lock-ordering trap.
    #[inline]
    pub fn queue(&self) -> &dyn BlockingQueue<Task> {
        self.queue
    }

    /// Run `task` on the calling thread under the same panic guard workers
    /// use: a panicking task is logged and counted, never propagated.
    pub fn run_inline(&self, task: Task) {
        if run_guarded(task) {
            tracing::warn!("caller-run task panicked");
            self.metrics.record_panicked();
        } else {
            self.metrics.record_completed();
        }
    }
}

/// Strategy invoked when admission fails.
///
/// Implementations must not block indefinitely on anything other than the
/// pool's own queue, and must not attempt to resubmit through the executor.
pub trait RejectionPolicy: Send + Sync {
    /// Decide the fate of `task`. Returning `Err` surfaces the task back to
    /// the submitter.
    fn reject(&self, task: Task, pool: &PoolHandle<'_>) -> Result<(), Rejected>;
}

/// Refuse the task: the submitter gets it back as [`Rejected`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Abort;

impl RejectionPolicy for Abort {
    fn reject(&self, task: Task, _pool: &PoolHandle<'_>) -> Result<(), Rejected> {
        Err(Rejected(task))
    }
}

/// Drop the task silently.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl RejectionPolicy for Discard {
    fn reject(&self, task: Task, _pool: &PoolHandle<'_>) -> Result<(), Rejected> {
        tracing::debug!("task discarded by rejection policy");
        drop(task);
        Ok(())
    }
}

/// Make room by dropping the oldest backlogged task, then enqueue this one.
///
/// Uses the non-blocking queue API (`poll` then `offer`), never the
/// executor's own locks, so submission stays non-blocking. Another producer
/// may slip into the freed slot between the two calls; the policy is "drop
/// to make room", not "atomic replace", and a replacement that finds no room
/// is dropped. On a stopping pool or a closed queue it degrades to
/// [`Discard`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardOldest;

impl RejectionPolicy for DiscardOldest {
    fn reject(&self, task: Task, pool: &PoolHandle<'_>) -> Result<(), Rejected> {
        if pool.is_shutdown() {
            tracing::debug!("task discarded: pool stopping");
            return Ok(());
        }
        if let Some(oldest) = pool.queue().poll() {
            tracing::debug!("oldest backlogged task discarded to make room");
            drop(oldest);
        }
        if pool.queue().offer(task).is_err() {
            tracing::debug!("task discarded: no room for replacement");
        }
        Ok(())
    }
}

/// Run the task synchronously on the submitting thread.
///
/// Throttles producers by making them pay for the work they could not hand
/// off. The inline run uses the worker panic guard, so a panicking task does
/// not unwind into the submitter.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallerRuns;

impl RejectionPolicy for CallerRuns {
    fn reject(&self, task: Task, pool: &PoolHandle<'_>) -> Result<(), Rejected> {
        if pool.is_shutdown() {
            tracing::debug!("task discarded: pool stopping");
            return Ok(());
        }
        pool.run_inline(task);
        Ok(())
    }
}
