//! # Queue Error Types
//!
//! Errors reported to callers blocked on the owner thread.
//!
//! A stale widget handle is deliberately *not* represented here: proxies
//! answer with a documented default instead, because a script cannot do
//! anything useful with "the window already closed".

use thiserror::Error;

/// Errors returned by blocking submissions to the action queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been shut down; nothing will be drained again.
    #[error("action queue is shut down")]
    ShutDown,

    /// The caller's wait bound elapsed before the owner thread executed the
    /// task. The task itself stays queued and will still run.
    #[error("timed out waiting for the owner thread")]
    Timeout,

    /// The task panicked while the owner thread executed it.
    #[error("queued task failed: {reason}")]
    TaskFailed {
        /// The panic message, best effort.
        reason: String,
    },
}

/// Result type for blocking queue operations.
pub type QueueResult<T> = Result<T, QueueError>;
