//! The unit of work accepted by the pool.

/// A parameterless, result-less unit of work.
///
/// Tasks are owned by whichever component currently holds them: the caller
/// until [`Executor::submit`](crate::Executor::submit) returns, then the
/// executor during admission, the queue while backlogged, or a worker while
/// running. They are moved across those boundaries, never copied, and their
/// storage is released as soon as the closure returns.
///
/// The pool delivers no result back to the submitter; tasks that need to
/// report out should capture their own channel or shared state.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Box a closure into a [`Task`].
///
/// Purely a readability helper for submission sites:
///
/// ```
/// use pool_rs::task;
///
/// let t = task(|| println!("hello from the pool"));
/// t();
/// ```
#[inline]
pub fn task<F>(f: F) -> Task
where
    F: FnOnce() + Send + 'static,
{
    Box::new(f)
}
