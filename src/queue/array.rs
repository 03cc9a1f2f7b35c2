//! Array-backed bounded blocking queue.
//!
//! # Purpose
//!
//! The default [`BlockingQueue`] implementation: a `VecDeque` ring guarded by
//! a single mutex, with two condition variables (`not_empty`, `not_full`)
//! signalling each end. This is deliberately Mutex + Condvar rather than a
//! lock-free structure: the queue is the pool's blocking back-pressure
//! surface, producers and consumers *want* to sleep here, and condvars give
//! efficient blocking without subtle memory-ordering bugs.
//!
//! # Correctness Invariants
//!
//! - `len <= capacity` at all times.
//! - `closed` is monotonic: once set it is never cleared, and no append
//!   succeeds afterwards.
//! - Every wait re-checks its predicate (`closed || !full` for producers,
//!   `closed || !empty` for consumers); a spurious wakeup never produces a
//!   result or a duplicate append.
//! - Consumers drain remaining items before reporting closure.
//! - The mutex is held only across predicate checks and item transfer, never
//!   across user code.
//!
//! # Capacity zero
//!
//! A 0-capacity queue is a valid configuration that admits no backlog:
//! `offer` always fails, `put` blocks until closure and then fails, and
//! consumers behave normally (they simply never see an item). The executor
//! uses this to force every admitted task onto the "must run a worker" path.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::QueueClosed;
use crate::queue::BlockingQueue;

/// Mutable state guarded by the queue mutex.
#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Bounded FIFO with blocking, timed, and non-blocking operations.
///
/// # Thread Safety
///
/// All operations take `&self`; share freely via `Arc` or borrow from an
/// owner that outlives the users. Producers park on `not_full`, consumers on
/// `not_empty`, and [`close`](BlockingQueue::close) broadcasts both so every
/// waiter re-checks its predicate and observes shutdown.
pub struct ArrayBoundedQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> ArrayBoundedQueue<T> {
    /// Create a queue bounded at `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().expect("queue mutex poisoned")
    }

    /// Lock with poison recovery.
    ///
    /// `close` runs on the executor's drop path, where a panic would risk a
    /// process abort. If a producer or consumer panicked while holding the
    /// mutex we still need to wake the remaining waiters, so recover the
    /// inner state and continue.
    #[inline]
    fn lock_or_recover(&self) -> MutexGuard<'_, State<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }
}

impl<T: Send> BlockingQueue<T> for ArrayBoundedQueue<T> {
    fn offer(&self, item: T) -> Result<(), T> {
        let mut st = self.lock();
        if st.closed || st.items.len() >= self.capacity {
            return Err(item);
        }
        st.items.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    fn offer_timeout(&self, item: T, timeout: Duration) -> Result<(), T> {
        let deadline = Instant::now() + timeout;
        let mut st = self.lock();
        while !st.closed && st.items.len() >= self.capacity {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(item);
            }
            let (guard, result) = self
                .not_full
                .wait_timeout(st, remaining)
                .expect("queue condvar poisoned");
            st = guard;
            if result.timed_out() && !st.closed && st.items.len() >= self.capacity {
                return Err(item);
            }
        }
        if st.closed {
            return Err(item);
        }
        st.items.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    fn put(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut st = self.lock();
        while !st.closed && st.items.len() >= self.capacity {
            st = self.not_full.wait(st).expect("queue condvar poisoned");
        }
        if st.closed {
            return Err(QueueClosed(item));
        }
        st.items.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    fn poll(&self) -> Option<T> {
        let mut st = self.lock();
        let item = st.items.pop_front();
        if item.is_some() {
            drop(st);
            self.not_full.notify_one();
        }
        item
    }

    fn poll_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut st = self.lock();
        while st.items.is_empty() && !st.closed {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, result) = self
                .not_empty
                .wait_timeout(st, remaining)
                .expect("queue condvar poisoned");
            st = guard;
            if result.timed_out() && st.items.is_empty() {
                return None;
            }
        }
        let item = st.items.pop_front();
        if item.is_some() {
            drop(st);
            self.not_full.notify_one();
        }
        item
    }

    fn take(&self) -> Option<T> {
        let mut st = self.lock();
        while st.items.is_empty() && !st.closed {
            st = self.not_empty.wait(st).expect("queue condvar poisoned");
        }
        // Closed queues still hand out their backlog; None means drained.
        let item = st.items.pop_front();
        if item.is_some() {
            drop(st);
            self.not_full.notify_one();
        }
        item
    }

    fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().items.front().cloned()
    }

    fn len(&self) -> usize {
        self.lock().items.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.lock().items.len())
    }

    fn close(&self) {
        let mut st = self.lock_or_recover();
        st.closed = true;
        drop(st);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> fmt::Debug for ArrayBoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.lock_or_recover();
        f.debug_struct("ArrayBoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &st.items.len())
            .field("closed", &st.closed)
            .finish_non_exhaustive()
    }
}


#[cfg(all(test, feature = "pool-proptest"))]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    const PROPTEST_CASES: u32 = 64;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Offer(u32),
        Poll,
        Peek,
        Close,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => any::<u32>().prop_map(Op::Offer),
            4 => Just(Op::Poll),
            1 => Just(Op::Peek),
            1 => Just(Op::Close),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(
            crate::test_utils::proptest_cases(PROPTEST_CASES)
        ))]

        /// The queue tracks a VecDeque-plus-closed-flag model exactly.
        #[test]
        fn model(
            capacity in 0usize..8,
            ops in prop::collection::vec(op_strategy(), 1..200),
        ) {
            let q = ArrayBoundedQueue::new(capacity);
            let mut shadow: VecDeque<u32> = VecDeque::new();
            let mut closed = false;

            for op in ops {
                match op {
                    Op::Offer(v) => {
                        let expect_ok = !closed && shadow.len() < capacity;
                        match q.offer(v) {
                            Ok(()) => {
                                prop_assert!(expect_ok);
                                shadow.push_back(v);
                            }
                            Err(back) => {
                                prop_assert!(!expect_ok);
                                prop_assert_eq!(back, v);
                            }
                        }
                    }
                    Op::Poll => {
                        prop_assert_eq!(q.poll(), shadow.pop_front());
                    }
                    Op::Peek => {
                        prop_assert_eq!(q.peek(), shadow.front().copied());
                    }
                    Op::Close => {
                        q.close();
                        closed = true;
                    }
                }

                prop_assert_eq!(q.len(), shadow.len());
                prop_assert!(q.len() <= capacity);
                prop_assert_eq!(q.remaining_capacity(), capacity - shadow.len());
                prop_assert_eq!(q.is_closed(), closed);
            }

            // Drain: remaining items come out in FIFO order, then None.
            q.close();
            while let Some(expected) = shadow.pop_front() {
                prop_assert_eq!(q.take(), Some(expected));
            }
            prop_assert_eq!(q.take(), None);
        }
    }
}
