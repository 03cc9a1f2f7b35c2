//! Bounded thread-pool executor.
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    Executor                      │
//!                      │                                                  │
//!  submit(task) ───────┼─► admission ──┬─► core worker   (take)           │
//!                      │   (4 steps)   ├─► backlog queue ─► workers       │
//!                      │               ├─► overflow worker (poll_timeout) │
//!                      │               └─► rejection policy               │
//!                      │                                                  │
//!                      │   Shared: queue, worker_count, stopping,         │
//!                      │           finished + completion_cv, metrics      │
//!                      └──────────────────────────────────────────────────┘
//! ```
//!
//! Admission is a four-step cascade biased toward keeping a steady pool warm
//! and using the queue as the primary back-pressure surface:
//!
//! 1. **Grow to core** — below `core_size`, reserve a slot (CAS loop) and
//!    spawn a permanent worker with the task as its hand-off.
//! 2. **Enqueue** — try a non-blocking `offer`. A safety net covers
//!    `core_size == 0`: if the backlog gained an item while no worker is
//!    alive, spawn one overflow worker to drain it.
//! 3. **Grow to max** — queue full: reserve up to `max_size` and spawn a
//!    temporary worker with the task as its hand-off.
//! 4. **Reject** — hand the task to the configured [`RejectionPolicy`].
//!
//! # Correctness Invariants
//!
//! - `worker_count <= max_size` at all times: slots are reserved with a
//!   compare-and-swap loop *before* a thread is spawned, so racing
//!   submitters cannot both think they are within the cap.
//! - Once shutdown begins, no new worker is spawned; a reservation that
//!   loses the race against shutdown is rolled back.
//! - Every submitted task settles exactly once: a worker runs it, or the
//!   rejection policy takes it, or it is discarded with the backlog at
//!   shutdown.
//! - A hand-off task bypasses the queue and may run before earlier backlog;
//!   strict submission-order execution is deliberately not guaranteed.
//!
//! # Lock ordering
//!
//! `workers` (join-handle list) is never held while calling into the queue;
//! `finished` is never held while running a task; the queue's internal mutex
//! is held only across predicate checks and item transfer. The one nested
//! acquisition is `wait_for_completion`, which reads the queue while holding
//! `finished` — the reverse order never occurs.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_utils::CachePadded;

use crate::error::Rejected;
use crate::metrics::{MetricsSnapshot, PoolMetrics};
use crate::policy::{Abort, PoolHandle, RejectionPolicy};
use crate::queue::{ArrayBoundedQueue, BlockingQueue};
use crate::task::Task;
use crate::worker::{worker_main, FetchStrategy};

/// Backlog bound used by [`Builder`] when no queue is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Overflow-worker idle timeout used by [`Builder`] by default.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

// ============================================================================
// Configuration
// ============================================================================

/// Pool sizing configuration.
///
/// `core_size` permanent workers are created on demand and live until
/// shutdown; up to `max_size - core_size` temporary workers absorb bursts
/// once the backlog is full and retire after `keep_alive` of idleness.
#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    /// Permanent worker cap. Zero is legal: every task then runs on
    /// overflow workers or the submitter.
    pub core_size: usize,
    /// Hard cap on live workers, `>= core_size`.
    pub max_size: usize,
    /// Idle time after which an overflow worker retires. Zero makes
    /// overflow workers exit as soon as the queue is empty.
    pub keep_alive: Duration,
}

impl PoolConfig {
    /// Validate configuration. Panics on invalid values.
    pub fn validate(&self) {
        assert!(
            self.core_size <= self.max_size,
            "core_size {} must not exceed max_size {}",
            self.core_size,
            self.max_size
        );
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        let cores = num_cpus::get();
        Self {
            core_size: cores,
            max_size: cores,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

// ============================================================================
// Shared state
// ============================================================================

/// State shared between the executor owner and every worker thread.
///
/// The executor exclusively owns its queue and policy; workers reach them
/// through this struct for exactly as long as the executor keeps them alive
/// (enforced by join-on-shutdown).
pub(crate) struct Shared {
    config: PoolConfig,
    pub(crate) queue: Box<dyn BlockingQueue<Task>>,
    policy: Box<dyn RejectionPolicy>,

    /// Live workers, core + overflow. Mutated only by CAS reservation
    /// (growth) and plain decrement (exit/rollback).
    worker_count: CachePadded<AtomicUsize>,

    /// Monotonic id source for worker thread names.
    next_worker_id: AtomicUsize,

    /// Shutdown flag. Monotonic false → true.
    stopping: AtomicBool,

    /// Settled-task counter for the barrier. Guarded by its own mutex and
    /// paired with `completion`; never held while running a task.
    finished: Mutex<usize>,
    completion: Condvar,

    pub(crate) metrics: PoolMetrics,
}

impl Shared {
    #[inline]
    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    #[inline]
    fn live_workers(&self) -> usize {
        self.worker_count.load(Ordering::Acquire)
    }

    /// Reserve one worker slot below `cap`.
    ///
    /// The CAS loop is what keeps concurrent submitters honest: both may
    /// observe `count < cap`, but only one can move the counter.
    fn reserve_slot(&self, cap: usize) -> bool {
        let mut count = self.worker_count.load(Ordering::Acquire);
        loop {
            if count >= cap {
                return false;
            }
            match self.worker_count.compare_exchange_weak(
                count,
                count + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => count = actual,
            }
        }
    }

    /// Give back one reserved slot: worker exit, or rollback of a
    /// reservation that lost the race against shutdown.
    #[inline]
    pub(crate) fn release_slot(&self) {
        self.worker_count.fetch_sub(1, Ordering::AcqRel);
    }

    /// Count one settled task and wake the barrier.
    pub(crate) fn settle(&self) {
        {
            let mut finished = self.finished.lock().expect("finish mutex poisoned");
            *finished += 1;
        }
        self.completion.notify_all();
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Which flavor of worker a reservation is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorkerRole {
    Core,
    Overflow,
}

/// Bounded thread-pool executor.
///
/// # Lifecycle
///
/// 1. Build with [`Executor::new`] or [`Executor::builder`]. No threads are
///    created up front; workers appear on demand during admission.
/// 2. [`submit`](Executor::submit) fire-and-forget tasks.
/// 3. Optionally [`wait_for_completion`](Executor::wait_for_completion) as a
///    reusable barrier.
/// 4. [`shutdown`](Executor::shutdown) for final metrics, or just drop the
///    executor — both set the stopping flag, close the queue, and join every
///    worker. Running tasks finish; the remaining backlog is discarded.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use pool_rs::{task, Executor};
///
/// let pool = Executor::builder()
///     .core_size(2)
///     .max_size(4)
///     .queue_capacity(8)
///     .build();
///
/// let done = Arc::new(AtomicUsize::new(0));
/// for _ in 0..8 {
///     let done = Arc::clone(&done);
///     pool.submit(task(move || {
///         done.fetch_add(1, Ordering::Relaxed);
///     }))
///     .unwrap();
/// }
///
/// pool.wait_for_completion(8);
/// assert_eq!(done.load(Ordering::Relaxed), 8);
/// ```
pub struct Executor {
    shared: Arc<Shared>,
    /// Join handles, append-only until shutdown. Never held while calling
    /// into the queue.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Executor {
    /// Create an executor from validated parts.
    ///
    /// # Panics
    ///
    /// Panics if `config` violates `core_size <= max_size`.
    pub fn new(
        config: PoolConfig,
        queue: Box<dyn BlockingQueue<Task>>,
        policy: Box<dyn RejectionPolicy>,
    ) -> Self {
        config.validate();
        Self {
            shared: Arc::new(Shared {
                config,
                queue,
                policy,
                worker_count: CachePadded::new(AtomicUsize::new(0)),
                next_worker_id: AtomicUsize::new(0),
                stopping: AtomicBool::new(false),
                finished: Mutex::new(0),
                completion: Condvar::new(),
                metrics: PoolMetrics::default(),
            }),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Start configuring an executor.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Admit `task`, or apply the rejection policy.
    ///
    /// Non-blocking except under the `CallerRuns` policy, which runs the
    /// task inline on this thread. `Err` is only possible under the
    /// [`Abort`] policy and carries the task back.
    pub fn submit(&self, task: Task) -> Result<(), Rejected> {
        let shared = &self.shared;
        if shared.is_stopping() {
            return self.reject(task);
        }

        // 1. Grow to core.
        if shared.reserve_slot(shared.config.core_size) {
            return self.spawn_reserved(WorkerRole::Core, Some(task));
        }

        // 2. Enqueue into the backlog.
        match shared.queue.offer(task) {
            Ok(()) => {
                shared.metrics.record_enqueued();
                // Safety net for core_size == 0: the item just queued has no
                // worker to drain it unless we start one.
                if shared.live_workers() == 0 && shared.reserve_slot(shared.config.max_size) {
                    return self.spawn_reserved(WorkerRole::Overflow, None);
                }
                Ok(())
            }
            Err(task) => {
                // 3. Grow to max.
                if shared.reserve_slot(shared.config.max_size) {
                    return self.spawn_reserved(WorkerRole::Overflow, Some(task));
                }
                // 4. Reject.
                self.reject(task)
            }
        }
    }

    /// Spawn a worker for an already-reserved slot.
    ///
    /// The reservation happened first, so the count can never overshoot the
    /// cap; if shutdown won the race in between, the slot is rolled back and
    /// the hand-off task goes to the rejection path instead.
    fn spawn_reserved(&self, role: WorkerRole, first_task: Option<Task>) -> Result<(), Rejected> {
        let shared = &self.shared;
        if shared.is_stopping() {
            shared.release_slot();
            return match first_task {
                Some(task) => self.reject(task),
                None => Ok(()),
            };
        }

        let id = shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let strategy = match role {
            WorkerRole::Core => {
                shared.metrics.record_core_spawned();
                FetchStrategy::Blocking
            }
            WorkerRole::Overflow => {
                shared.metrics.record_overflow_spawned();
                FetchStrategy::Timed(shared.config.keep_alive)
            }
        };

        let worker_shared = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name(format!("pool-worker-{id}"))
            .spawn(move || worker_main(worker_shared, id, strategy, first_task))
            .expect("failed to spawn worker thread");

        self.workers
            .lock()
            .expect("workers mutex poisoned")
            .push(handle);
        Ok(())
    }

    /// Hand `task` to the rejection policy and settle it.
    ///
    /// Every rejection settles exactly once, whatever the policy does, so
    /// `wait_for_completion(total_submitted)` terminates under all four
    /// policies. A task DiscardOldest re-admits settles again when a worker
    /// runs it; the task it displaced never settles — net one settlement per
    /// submission.
    fn reject(&self, task: Task) -> Result<(), Rejected> {
        let shared = &self.shared;
        let handle = PoolHandle {
            queue: shared.queue.as_ref(),
            stopping: shared.is_stopping(),
            metrics: &shared.metrics,
        };
        let outcome = shared.policy.reject(task, &handle);
        shared.metrics.record_rejected();
        shared.settle();
        outcome
    }

    /// Block until at least `n` tasks have settled and the backlog is empty,
    /// then reset the settled counter so the barrier can be reused.
    ///
    /// A task settles when a worker finishes it (normally or by panic) or
    /// when the rejection policy takes it. The comparison is saturating
    /// rather than exact: a `DiscardOldest` rejection that races the workers
    /// can settle twice (once at rejection, once when the re-admitted task
    /// runs) without displacing anything, and an exact match would then
    /// never be observed. The count must not exceed what the caller actually
    /// submitted since the last reset; waiting for more settlements than
    /// will ever happen blocks forever.
    pub fn wait_for_completion(&self, n: usize) {
        let shared = &self.shared;
        let mut finished = shared.finished.lock().expect("finish mutex poisoned");
        loop {
            if *finished >= n && shared.queue.is_empty() {
                *finished = 0;
                return;
            }
            finished = shared
                .completion
                .wait(finished)
                .expect("finish condvar poisoned");
        }
    }

    /// True once shutdown has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_stopping()
    }

    /// Live workers, core + overflow. Snapshot; may be stale immediately.
    pub fn worker_count(&self) -> usize {
        self.shared.live_workers()
    }

    /// Point-in-time copy of the pool counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// White-box invariant probe for tests: worker count within the hard
    /// cap, backlog within its bound.
    pub fn check_invariants(&self) -> bool {
        let shared = &self.shared;
        shared.live_workers() <= shared.config.max_size
            && shared.queue.len() <= shared.queue.capacity()
    }

    /// Shut down and return the final counters.
    ///
    /// Sets the stopping flag, closes the queue (waking every blocked
    /// worker), and joins all workers. Running tasks finish; backlog still
    /// queued is discarded. Dropping the executor performs the same
    /// protocol; this method additionally hands back the metrics.
    pub fn shutdown(self) -> MetricsSnapshot {
        self.shutdown_inner();
        self.shared.metrics.snapshot()
    }

    fn shutdown_inner(&self) {
        let already_stopping = self.shared.stopping.swap(true, Ordering::AcqRel);
        self.shared.queue.close();
        if !already_stopping {
            tracing::debug!("pool shutting down");
        }

        // Re-drain until empty: a submit racing shutdown may append a handle
        // after the first sweep.
        loop {
            let drained: Vec<JoinHandle<()>> = {
                let mut workers = self.workers.lock().expect("workers mutex poisoned");
                workers.drain(..).collect()
            };
            if drained.is_empty() {
                return;
            }
            for handle in drained {
                if handle.join().is_err() {
                    // Task panics are caught inside the worker; reaching here
                    // means the worker loop itself failed.
                    tracing::warn!("worker thread panicked outside a task");
                }
            }
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("core_size", &self.shared.config.core_size)
            .field("max_size", &self.shared.config.max_size)
            .field("keep_alive", &self.shared.config.keep_alive)
            .field("worker_count", &self.worker_count())
            .field("stopping", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent executor construction with workable defaults.
///
/// Defaults: `core_size = max_size = num_cpus::get()`, a 30 s keep-alive, a
/// [`DEFAULT_QUEUE_CAPACITY`]-slot [`ArrayBoundedQueue`], and the [`Abort`]
/// policy.
#[must_use = "call build() to create the executor"]
pub struct Builder {
    core_size: Option<usize>,
    max_size: Option<usize>,
    keep_alive: Duration,
    queue: Option<Box<dyn BlockingQueue<Task>>>,
    policy: Box<dyn RejectionPolicy>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            core_size: None,
            max_size: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
            queue: None,
            policy: Box::new(Abort),
        }
    }

    /// Permanent worker cap.
    pub fn core_size(mut self, n: usize) -> Self {
        self.core_size = Some(n);
        self
    }

    /// Hard worker cap. Defaults to the core size when unset.
    pub fn max_size(mut self, n: usize) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Overflow-worker idle timeout.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Use a specific backlog queue.
    pub fn queue(mut self, queue: impl BlockingQueue<Task> + 'static) -> Self {
        self.queue = Some(Box::new(queue));
        self
    }

    /// Use an [`ArrayBoundedQueue`] of the given capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue = Some(Box::new(ArrayBoundedQueue::new(capacity)));
        self
    }

    /// Rejection policy for tasks admission cannot place.
    pub fn policy(mut self, policy: impl RejectionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Build the executor.
    ///
    /// # Panics
    ///
    /// Panics if the resulting sizes violate `core_size <= max_size`.
    pub fn build(self) -> Executor {
        let core_size = self.core_size.unwrap_or_else(num_cpus::get);
        let max_size = self.max_size.unwrap_or(core_size);
        let config = PoolConfig {
            core_size,
            max_size,
            keep_alive: self.keep_alive,
        };
        let queue = self
            .queue
            .unwrap_or_else(|| Box::new(ArrayBoundedQueue::new(DEFAULT_QUEUE_CAPACITY)));
        Executor::new(config, queue, self.policy)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("core_size", &self.core_size)
            .field("max_size", &self.max_size)
            .field("keep_alive", &self.keep_alive)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CallerRuns, Discard, DiscardOldest};
    use crate::task::task;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Condvar as StdCondvar, Mutex as StdMutex};

    /// Reusable open/closed latch for holding tasks in a known state.
    struct Gate {
        open: StdMutex<bool>,
        cv: StdCondvar,
    }

    impl Gate {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                open: StdMutex::new(false),
                cv: StdCondvar::new(),
            })
        }

        fn wait(&self) {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.cv.wait(open).unwrap();
            }
        }

        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.cv.notify_all();
        }
    }

    fn small_pool(
        core: usize,
        max: usize,
        capacity: usize,
        policy: impl RejectionPolicy + 'static,
    ) -> Executor {
        Executor::builder()
            .core_size(core)
            .max_size(max)
            .keep_alive(Duration::from_millis(100))
            .queue_capacity(capacity)
            .policy(policy)
            .build()
    }

    #[test]
    fn admission_cascade_core_queue_overflow_reject() {
        let pool = small_pool(1, 2, 1, Abort);
        let gate = Gate::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let blocker = |gate: &Arc<Gate>, ran: &Arc<AtomicUsize>| {
            let (g, r) = (Arc::clone(gate), Arc::clone(ran));
            task(move || {
                g.wait();
                r.fetch_add(1, Ordering::Relaxed);
            })
        };

        // 1st: spawns the core worker, runs as its hand-off.
        pool.submit(blocker(&gate, &ran)).unwrap();
        assert_eq!(pool.worker_count(), 1);

        // 2nd: core is saturated, lands in the backlog.
        pool.submit(blocker(&gate, &ran)).unwrap();
        assert_eq!(pool.worker_count(), 1);

        // 3rd: backlog full, spawns the overflow worker.
        pool.submit(blocker(&gate, &ran)).unwrap();
        assert_eq!(pool.worker_count(), 2);

        // 4th: everything saturated, Abort surfaces it.
        let err = pool.submit(task(|| {})).unwrap_err();
        drop(err);
        assert!(pool.check_invariants());

        gate.release();
        // 3 completions + 1 rejection settle.
        pool.wait_for_completion(4);
        assert_eq!(ran.load(Ordering::Relaxed), 3);

        let snap = pool.metrics();
        assert_eq!(snap.core_workers_spawned, 1);
        assert_eq!(snap.overflow_workers_spawned, 1);
        assert_eq!(snap.tasks_enqueued, 1);
        assert_eq!(snap.tasks_rejected, 1);
        assert_eq!(snap.tasks_completed, 3);
    }

    #[test]
    fn abort_pool_remains_usable_after_rejection() {
        let pool = small_pool(1, 1, 1, Abort);
        let gate = Gate::new();

        let g = Arc::clone(&gate);
        pool.submit(task(move || g.wait())).unwrap();
        pool.submit(task(|| {})).unwrap();
        assert!(pool.submit(task(|| {})).is_err());

        gate.release();
        pool.wait_for_completion(3);

        // Pool still admits and runs work.
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        pool.submit(task(move || {
            r.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
        pool.wait_for_completion(1);
        assert_eq!(ran.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn core_zero_safety_net_spawns_a_drainer() {
        let pool = small_pool(0, 2, 4, Discard);
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);

        pool.submit(task(move || {
            r.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();

        pool.wait_for_completion(1);
        assert_eq!(ran.load(Ordering::Relaxed), 1);
        assert_eq!(pool.metrics().overflow_workers_spawned, 1);
        assert_eq!(pool.metrics().core_workers_spawned, 0);
    }

    #[test]
    fn keep_alive_reaps_idle_overflow_workers() {
        let pool = Executor::builder()
            .core_size(0)
            .max_size(2)
            .keep_alive(Duration::from_millis(50))
            .queue_capacity(0)
            .policy(Discard)
            .build();

        pool.submit(task(|| {})).unwrap();
        pool.submit(task(|| {})).unwrap();
        pool.wait_for_completion(2);

        // Both workers idle out within the keep-alive (plus slack).
        thread::sleep(Duration::from_millis(600));
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(pool.metrics().overflow_idle_exits, 2);
    }

    #[test]
    fn core_workers_survive_idleness() {
        let pool = small_pool(2, 2, 4, Discard);
        pool.submit(task(|| {})).unwrap();
        pool.submit(task(|| {})).unwrap();
        pool.wait_for_completion(2);

        thread::sleep(Duration::from_millis(400));
        assert_eq!(pool.worker_count(), 2, "core workers never idle out");
    }

    #[test]
    fn zero_max_pool_rejects_everything() {
        let pool = small_pool(0, 0, 0, Discard);
        for _ in 0..5 {
            pool.submit(task(|| panic!("must never run"))).unwrap();
        }
        // Rejections alone satisfy the barrier.
        pool.wait_for_completion(5);
        let snap = pool.metrics();
        assert_eq!(snap.tasks_rejected, 5);
        assert_eq!(snap.tasks_completed, 0);
        assert_eq!(snap.tasks_panicked, 0);
    }

    #[test]
    fn caller_runs_policy_throttles_submitter() {
        let pool = small_pool(0, 0, 0, CallerRuns);
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        pool.submit(task(move || {
            r.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
        // Ran synchronously on this thread before submit returned.
        assert_eq!(ran.load(Ordering::Relaxed), 1);
        pool.wait_for_completion(1);
    }

    #[test]
    fn task_panic_does_not_kill_worker() {
        let pool = small_pool(1, 1, 4, Abort);
        let ran = Arc::new(AtomicUsize::new(0));

        pool.submit(task(|| panic!("intentional test panic")))
            .unwrap();
        let r = Arc::clone(&ran);
        pool.submit(task(move || {
            r.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();

        pool.wait_for_completion(2);
        assert_eq!(ran.load(Ordering::Relaxed), 1);
        let snap = pool.metrics();
        assert_eq!(snap.tasks_panicked, 1);
        assert_eq!(snap.tasks_completed, 1);
        assert_eq!(pool.worker_count(), 1, "the worker survived the panic");
    }

    #[test]
    fn barrier_resets_between_iterations() {
        let pool = small_pool(2, 4, 2, DiscardOldest);
        for _ in 0..3 {
            for _ in 0..6 {
                pool.submit(task(|| {})).unwrap();
            }
            pool.wait_for_completion(6);
            assert!(pool.check_invariants());
        }
    }

    #[test]
    fn fifo_order_through_a_single_worker() {
        const N: usize = 200;
        let pool = small_pool(1, 1, N, Abort);
        let gate = Gate::new();
        let order = Arc::new(StdMutex::new(Vec::with_capacity(N)));

        // Hold the lone worker so every numbered task goes through the queue.
        let g = Arc::clone(&gate);
        pool.submit(task(move || g.wait())).unwrap();

        for i in 0..N {
            let order = Arc::clone(&order);
            pool.submit(task(move || {
                order.lock().unwrap().push(i);
            }))
            .unwrap();
        }

        gate.release();
        pool.wait_for_completion(N + 1);

        let seen = order.lock().unwrap();
        let expected: Vec<usize> = (0..N).collect();
        assert_eq!(*seen, expected, "queued tasks run in submission order");
    }

    #[test]
    fn worker_cap_holds_under_concurrent_submission() {
        const SUBMITTERS: usize = 8;
        const PER_SUBMITTER: usize = 50;

        let pool = Arc::new(small_pool(2, 4, 2, Discard));

        let threads: Vec<_> = (0..SUBMITTERS)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..PER_SUBMITTER {
                        pool.submit(task(|| {
                            std::hint::black_box(42);
                        }))
                        .unwrap();
                        assert!(pool.check_invariants());
                    }
                })
            })
            .collect();

        for th in threads {
            th.join().unwrap();
        }

        // Every submission settles exactly once: as a completion or a
        // Discard rejection. The barrier therefore terminates at the total.
        pool.wait_for_completion(SUBMITTERS * PER_SUBMITTER);

        assert!(pool.check_invariants());
        let snap = pool.metrics();
        assert_eq!(
            snap.tasks_completed + snap.tasks_rejected,
            (SUBMITTERS * PER_SUBMITTER) as u64
        );
    }

    #[test]
    fn shutdown_discards_backlog_and_returns_metrics() {
        let pool = small_pool(1, 1, 8, Discard);
        let gate = Gate::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let g = Arc::clone(&gate);
        let r = Arc::clone(&ran);
        pool.submit(task(move || {
            g.wait();
            r.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
        for _ in 0..8 {
            let r = Arc::clone(&ran);
            pool.submit(task(move || {
                r.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        }

        // Release the gate only after shutdown has set the stop flag, so the
        // worker finishes its running task, dequeues once, observes the flag,
        // and discards the rest of the backlog.
        let releaser = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                gate.release();
            })
        };
        let snap = pool.shutdown();
        releaser.join().unwrap();

        assert_eq!(snap.tasks_completed, 1, "only the in-flight task finished");
        assert_eq!(snap.tasks_enqueued, 8);
        assert_eq!(ran.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn drop_joins_all_workers() {
        let ran = Arc::new(AtomicUsize::new(0));
        {
            let pool = small_pool(2, 4, 4, Discard);
            for _ in 0..4 {
                let r = Arc::clone(&ran);
                pool.submit(task(move || {
                    r.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap();
            }
            pool.wait_for_completion(4);
        }
        // Drop returned, so every worker joined without deadlock.
        assert_eq!(ran.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn builder_defaults_produce_a_working_pool() {
        let pool = Executor::builder().build();
        assert!(!pool.is_shutdown());
        assert_eq!(pool.worker_count(), 0, "workers are created on demand");

        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        pool.submit(task(move || {
            r.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
        pool.wait_for_completion(1);
        assert_eq!(ran.load(Ordering::Relaxed), 1);
        assert!(pool.check_invariants());
    }

    #[test]
    #[should_panic(expected = "core_size 4 must not exceed max_size 2")]
    fn config_rejects_core_above_max() {
        PoolConfig {
            core_size: 4,
            max_size: 2,
            keep_alive: Duration::ZERO,
        }
        .validate();
    }

    #[test]
    fn keep_alive_zero_retires_overflow_immediately() {
        let pool = Executor::builder()
            .core_size(0)
            .max_size(1)
            .keep_alive(Duration::ZERO)
            .queue_capacity(0)
            .policy(Discard)
            .build();

        pool.submit(task(|| {})).unwrap();
        pool.wait_for_completion(1);

        thread::sleep(Duration::from_millis(200));
        assert_eq!(pool.worker_count(), 0);
    }
}
