//! # Callback Scheduler
//!
//! Turns "invoke this callable with this argument" into a queued task.
//!
//! The invocation runs detached: it takes no stage lock, so a callback is
//! free to re-enter the bridge (posting mutations, or blocking reads when
//! it happens to run on a worker-facing path). A callable that raises is
//! logged and forgotten; a callable that panics is caught by the drain.
//! Neither touches the subscription that delivered it.

use crate::value::{ScriptCallable, ScriptValue};
use crate::StageQueue;

/// Schedules script-callback invocations through the action queue.
#[derive(Clone)]
pub struct CallbackScheduler {
    queue: StageQueue,
}

impl CallbackScheduler {
    /// Creates a scheduler posting to the given queue.
    #[must_use]
    pub fn new(queue: StageQueue) -> Self {
        Self { queue }
    }

    /// Queues one invocation of `callable(arg)`.
    ///
    /// The pairing is single-use: it is consumed by the invocation whether
    /// the callable succeeds or raises.
    pub fn schedule(&self, callable: ScriptCallable, arg: ScriptValue) {
        self.queue.post_detached(move || {
            if let Err(error) = callable.invoke(arg) {
                tracing::warn!("script callback raised: {}", error);
            }
        });
    }
}
