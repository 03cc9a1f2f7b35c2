//! Bounded blocking FIFO queues.
//!
//! # Purpose
//!
//! The queue is the executor's primary back-pressure surface: once the core
//! workers are busy, submitted tasks land here until a worker drains them or
//! the bound forces the pool to grow or reject. The interface is a bounded
//! FIFO with blocking, timed, and non-blocking variants of both ends, plus a
//! monotonic close used as the global wakeup during shutdown.
//!
//! # Contract summary
//!
//! | Operation        | Blocks on   | Failure modes                       |
//! |------------------|-------------|-------------------------------------|
//! | `offer`          | never       | full or closed (item returned)      |
//! | `offer_timeout`  | `not_full`  | timeout or closed (item returned)   |
//! | `put`            | `not_full`  | closed (item returned in the error) |
//! | `poll`           | never       | empty                               |
//! | `poll_timeout`   | `not_empty` | timeout, or closed and drained      |
//! | `take`           | `not_empty` | closed and drained                  |
//! | `peek`           | never       | empty                               |
//!
//! Every wait is a predicate loop; a spurious wakeup never produces a result.
//! Consumers drain remaining items before reporting closure, so backlog
//! admitted before `close` is still observable afterwards.
//!
//! # Ordering
//!
//! Strict FIFO over successful producer/consumer pairs. When several waiters
//! race for the same slot or item, any one may win; fairness is not
//! guaranteed.

pub mod array;

pub use array::ArrayBoundedQueue;

use std::time::Duration;

use crate::error::QueueClosed;

/// A bounded, closeable, thread-safe FIFO.
///
/// Implementations guard all state behind their own synchronization; callers
/// never hold an implementation's lock across user code. The executor owns
/// its queue as a `Box<dyn BlockingQueue<Task>>`, so the trait stays
/// object-safe.
pub trait BlockingQueue<T: Send>: Send + Sync {
    /// Non-blocking append. Succeeds iff the queue is open and below
    /// capacity; otherwise the item comes back in `Err`. Wakes one consumer
    /// on success.
    fn offer(&self, item: T) -> Result<(), T>;

    /// As [`offer`](Self::offer), but waits up to `timeout` for space.
    /// Returns the item in `Err` on timeout or if the queue closed while
    /// waiting.
    fn offer_timeout(&self, item: T, timeout: Duration) -> Result<(), T>;

    /// Blocking append: waits for space without limit. Fails only when the
    /// queue is closed, handing the item back in [`QueueClosed`].
    fn put(&self, item: T) -> Result<(), QueueClosed<T>>;

    /// Non-blocking removal of the head. Wakes one producer on success.
    fn poll(&self) -> Option<T>;

    /// As [`poll`](Self::poll), but waits up to `timeout` for an item.
    /// Returns `None` on timeout; if the queue is closed and drained it
    /// returns `None` immediately.
    fn poll_timeout(&self, timeout: Duration) -> Option<T>;

    /// Blocking removal: waits until an item arrives or the queue is closed
    /// *and* drained. `None` means no item will ever arrive again.
    fn take(&self) -> Option<T>;

    /// Copy of the head without removal. Never blocks.
    fn peek(&self) -> Option<T>
    where
        T: Clone;

    /// Number of items currently queued.
    fn len(&self) -> usize;

    /// True when no items are queued.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The immutable bound. Capacity 0 is legal and means the queue never
    /// admits backlog.
    fn capacity(&self) -> usize;

    /// `capacity - len`; never underflows.
    fn remaining_capacity(&self) -> usize;

    /// Close the queue. Idempotent; wakes every blocked producer and
    /// consumer. No append succeeds afterwards.
    fn close(&self);

    /// True once [`close`](Self::close) has been observed.
    fn is_closed(&self) -> bool;
}
