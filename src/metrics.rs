//! Pool observability counters.
//!
//! Counters tick at task granularity (admission, settlement, worker
//! lifecycle), not on a per-item hot path, so shared atomics are affordable
//! here. Each counter is cache-line padded: workers on different cores bump
//! different counters concurrently, and padding keeps a completion on one
//! core from invalidating a rejection count on another.
//!
//! All reads are `Relaxed` snapshots: values are monotonic and eventually
//! consistent, good for dashboards and test assertions after a quiescent
//! point, not for synchronization. Use
//! [`Executor::wait_for_completion`](crate::Executor::wait_for_completion)
//! to synchronize, then read.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Live counters shared by the executor and every worker.
#[derive(Debug, Default)]
pub(crate) struct PoolMetrics {
    tasks_completed: CachePadded<AtomicU64>,
    tasks_panicked: CachePadded<AtomicU64>,
    tasks_rejected: CachePadded<AtomicU64>,
    tasks_enqueued: CachePadded<AtomicU64>,
    core_workers_spawned: CachePadded<AtomicU64>,
    overflow_workers_spawned: CachePadded<AtomicU64>,
    overflow_idle_exits: CachePadded<AtomicU64>,
}

impl PoolMetrics {
    #[inline]
    pub(crate) fn record_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_panicked(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_enqueued(&self) {
        self.tasks_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_core_spawned(&self) {
        self.core_workers_spawned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_overflow_spawned(&self) {
        self.overflow_workers_spawned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_overflow_idle_exit(&self) {
        self.overflow_idle_exits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
            tasks_enqueued: self.tasks_enqueued.load(Ordering::Relaxed),
            core_workers_spawned: self.core_workers_spawned.load(Ordering::Relaxed),
            overflow_workers_spawned: self.overflow_workers_spawned.load(Ordering::Relaxed),
            overflow_idle_exits: self.overflow_idle_exits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the pool counters.
///
/// `tasks_completed` counts tasks that ran to a normal return (including
/// tasks run inline by the `CallerRuns` policy); `tasks_panicked` counts
/// tasks whose run unwound. `tasks_rejected` counts every invocation of the
/// rejection policy, whatever the policy then did with the task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct MetricsSnapshot {
    pub tasks_completed: u64,
    pub tasks_panicked: u64,
    pub tasks_rejected: u64,
    pub tasks_enqueued: u64,
    pub core_workers_spawned: u64,
    pub overflow_workers_spawned: u64,
    pub overflow_idle_exits: u64,
}

impl MetricsSnapshot {
    /// Tasks that reached a terminal state: ran (normally or panicking), or
    /// were handed to the rejection policy.
    ///
    /// A task can contribute twice: `CallerRuns` counts it as rejected *and*
    /// completed, and a task re-admitted by `DiscardOldest` completes later
    /// while the task it displaced counts nowhere. The sum is a load
    /// indicator, not an exact submission count.
    pub fn tasks_settled(&self) -> u64 {
        self.tasks_completed + self.tasks_panicked + self.tasks_rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let m = PoolMetrics::default();
        m.record_completed();
        m.record_completed();
        m.record_rejected();
        m.record_overflow_spawned();

        let snap = m.snapshot();
        assert_eq!(snap.tasks_completed, 2);
        assert_eq!(snap.tasks_rejected, 1);
        assert_eq!(snap.tasks_panicked, 0);
        assert_eq!(snap.overflow_workers_spawned, 1);
        assert_eq!(snap.tasks_settled(), 3);
    }

    #[test]
    fn default_snapshot_is_zeroed() {
        assert_eq!(PoolMetrics::default().snapshot(), MetricsSnapshot::default());
    }
}
