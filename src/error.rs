//! Error types for admission and queue operations.
//!
//! Errors that refuse a value hand it back to the caller instead of dropping
//! it, so the submitter can rerun, reroute, or discard it deliberately.
//! Consumers should treat the carried value as still-live work.

use std::error::Error;
use std::fmt;

use crate::task::Task;

/// A task refused by admission.
///
/// Surfaced from [`Executor::submit`](crate::Executor::submit) only under the
/// [`Abort`](crate::policy::Abort) policy, when the core is saturated, the
/// backlog is full, and the overflow cap is exhausted. The task is carried
/// back so the submitter decides its fate.
pub struct Rejected(pub Task);

impl Rejected {
    /// Recover the rejected task.
    #[inline]
    pub fn into_task(self) -> Task {
        self.0
    }
}

impl fmt::Debug for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The task is an opaque closure; there is nothing useful to print.
        f.write_str("Rejected(..)")
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("task rejected: pool saturated and backlog full")
    }
}

impl Error for Rejected {}

/// An item refused by [`BlockingQueue::put`](crate::queue::BlockingQueue::put)
/// because the queue was closed before space became available.
///
/// Closure is the only failure mode for `put`; capacity pressure blocks
/// instead. The item is carried back to the producer.
pub struct QueueClosed<T>(pub T);

impl<T> QueueClosed<T> {
    /// Recover the item that could not be enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue closed while waiting to enqueue")
    }
}

impl<T> Error for QueueClosed<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_returns_task() {
        let err = Rejected(Box::new(|| {}));
        assert_eq!(format!("{err:?}"), "Rejected(..)");
        let task = err.into_task();
        task();
    }

    #[test]
    fn queue_closed_returns_item() {
        let err = QueueClosed(41usize);
        assert_eq!(format!("{err:?}"), "QueueClosed(..)");
        assert!(format!("{err}").contains("closed"));
        assert_eq!(err.into_inner(), 41);
    }
}
