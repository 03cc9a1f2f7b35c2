//! Bounded thread-pool executor with core and overflow workers.
//!
//! # Overview
//!
//! A caller submits fire-and-forget [`Task`]s; the executor runs them on a
//! managed set of OS threads. Admission follows the classic
//! "core + bounded backlog + temporary overflow + rejection policy" design:
//! a warm core pool absorbs steady load, a bounded blocking queue is the
//! primary back-pressure surface, short-lived overflow workers soak up
//! bursts up to a hard cap, and a pluggable [`RejectionPolicy`] decides the
//! fate of anything beyond that.
//!
//! ```text
//!  submit(task)
//!       │
//!       ▼
//!  ┌─ admission ──────────────────────────────────────────────┐
//!  │ 1. worker_count < core_size ──► spawn core worker        │
//!  │ 2. queue.offer(task)        ──► backlog (bounded FIFO)   │
//!  │ 3. worker_count < max_size  ──► spawn overflow worker    │
//!  │ 4. rejection policy         ──► Abort / Discard /        │
//!  │                                 DiscardOldest/CallerRuns │
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Core workers block on the queue and live until shutdown; overflow workers
//! use a timed poll and retire after `keep_alive` of idleness, shrinking the
//! pool back to its core size. Task panics are contained at the worker
//! boundary. Shutdown (explicit or on drop) closes the queue, lets running
//! tasks finish, discards the remaining backlog, and joins every worker.
//!
//! # Module map
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`task`] | The opaque unit of work |
//! | [`queue`] | `BlockingQueue` trait and the array-backed bounded queue |
//! | [`policy`] | Rejection policies invoked when admission fails |
//! | [`executor`] | Admission, worker lifecycle, shutdown, barrier wait |
//! | [`metrics`] | Pool counters and snapshots |
//! | [`error`] | Value-carrying admission/queue errors |
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use pool_rs::policy::DiscardOldest;
//! use pool_rs::{task, Executor};
//!
//! let pool = Executor::builder()
//!     .core_size(2)
//!     .max_size(4)
//!     .keep_alive(Duration::from_millis(500))
//!     .queue_capacity(16)
//!     .policy(DiscardOldest)
//!     .build();
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! for _ in 0..16 {
//!     let done = Arc::clone(&done);
//!     pool.submit(task(move || {
//!         done.fetch_add(1, Ordering::Relaxed);
//!     }))
//!     .unwrap();
//! }
//!
//! pool.wait_for_completion(16);
//! assert_eq!(done.load(Ordering::Relaxed), 16);
//! ```

pub mod error;
pub mod executor;
pub mod metrics;
pub mod policy;
pub mod queue;
pub mod task;
#[cfg(test)]
pub mod test_utils;
mod worker;

pub use error::{QueueClosed, Rejected};
pub use executor::{Builder, Executor, PoolConfig, DEFAULT_KEEP_ALIVE, DEFAULT_QUEUE_CAPACITY};
pub use metrics::MetricsSnapshot;
pub use policy::RejectionPolicy;
pub use queue::{ArrayBoundedQueue, BlockingQueue};
pub use task::{task, Task};
