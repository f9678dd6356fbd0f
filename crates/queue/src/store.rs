//! Queue store abstraction.
//!
//! The [`QueueStore`] trait is the only way worker code touches the shared
//! list store. Production code uses [`RedisQueue`](crate::RedisQueue); tests and
//! local runs use [`MemoryQueue`](crate::MemoryQueue).
//!
//! # List Orientation
//!
//! `push` inserts at the head and `move_blocking` takes from the tail, so
//! every queue behaves as a FIFO:
//!
//! ```text
//!   push ──▶ [ head ... tail ] ──▶ move_blocking
//! ```

use std::future::Future;

use crate::error::QueueError;

/// Trait abstracting list-based queue operations.
///
/// The trait is `Send + Sync + 'static`, allowing a single store to be shared
/// across async tasks behind an `Arc`.
pub trait QueueStore: Send + Sync + 'static {
    /// Atomically moves the tail of `source` onto the head of `dest`.
    ///
    /// Blocks until an item is available. There is no timeout: a worker has
    /// nothing else to do while idle. The item is never observable in both
    /// lists, nor in neither.
    fn move_blocking(
        &self,
        source: &str,
        dest: &str,
    ) -> impl Future<Output = Result<String, QueueError>> + Send;

    /// Inserts `item` at the head of `queue`.
    fn push(&self, queue: &str, item: &str) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Removes up to `count` occurrences of `item` from `queue`, head first.
    ///
    /// A `count` of 0 removes every occurrence, as `LREM` does.
    ///
    /// Returns the number of removed occurrences.
    fn remove(
        &self,
        queue: &str,
        item: &str,
        count: usize,
    ) -> impl Future<Output = Result<usize, QueueError>> + Send;

    /// Deletes the whole list.
    fn delete(&self, queue: &str) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Returns the number of items in `queue` (0 for a missing list).
    fn len(&self, queue: &str) -> impl Future<Output = Result<usize, QueueError>> + Send;
}
