//! # Deferred Action Queue
//!
//! A concurrent FIFO of thunks drained once per tick by the owner thread.
//!
//! ## Architecture
//!
//! ```text
//!             post / call (any thread)
//!                      │
//!                      ▼
//!            ┌───────────────────┐
//!            │  crossbeam MPSC   │   arrival order = execution order
//!            └─────────┬─────────┘
//!                      │ drain (owner thread, once per tick)
//!                      ▼
//!            ┌───────────────────┐
//!            │   Mutex<Stage>    │   locked per task, never across a
//!            └───────────────────┘   script-callback invocation
//! ```
//!
//! ## Thread Safety
//!
//! - Producers never block; `post` is append-only
//! - `call` parks the calling worker until the owner thread has executed
//!   the task and handed a value back
//! - `call` on the owner thread itself executes inline, bypassing the
//!   queue (blocking there would deadlock the drain)
//! - A panicking task is caught and logged; the rest of the drain runs
//!
//! ## Lock discipline
//!
//! Stage tasks run under the stage lock and must never submit blocking
//! calls themselves. Detached tasks (script-callback invocations) run
//! *without* the lock, so a callback that re-enters `call` on the owner
//! thread finds the mutex free.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::error::{QueueError, QueueResult};

/// One unit of deferred work.
enum Action<S> {
    /// Runs with exclusive access to the stage.
    Stage(Box<dyn FnOnce(&mut S) + Send>),
    /// Runs without touching the stage (script-callback invocations).
    Detached(Box<dyn FnOnce() + Send>),
}

/// Thread-safe deferred-action queue over an owner-held stage value.
///
/// The queue owns the stage: the owner thread reaches it through
/// [`ActionQueue::drain`] and [`ActionQueue::with_stage`], worker threads
/// only through submitted tasks.
///
/// ## Usage
///
/// ```rust,ignore
/// let queue = ActionQueue::new(Stage::new(800, 600)); // on the owner thread
///
/// // Worker thread: fire and forget
/// queue.post(move |stage| stage.widget_mut(id).unwrap().state_mut().rect.x = 5);
///
/// // Worker thread: read owner-consistent state
/// let x = queue.call(move |stage| stage.widget(id).map_or(0, |w| w.state().rect.x))?;
///
/// // Owner thread, once per tick
/// queue.drain();
/// ```
pub struct ActionQueue<S> {
    /// Producer side of the task buffer.
    tasks: Sender<Action<S>>,
    /// Consumer side; taken away on shutdown so the channel disconnects.
    pending: Mutex<Option<Receiver<Action<S>>>>,
    /// The owner-thread state all stage tasks run against.
    stage: Mutex<S>,
    /// Thread the queue was created on; the only thread allowed to drain.
    owner: ThreadId,
    /// False once `shutdown` has run.
    open: AtomicBool,
    /// Number of completed drains.
    ticks: AtomicU64,
}

impl<S> ActionQueue<S> {
    /// Creates a queue owning `stage`.
    ///
    /// Must be called on the owner thread: the current thread is recorded
    /// as the only one permitted to drain.
    #[must_use]
    pub fn new(stage: S) -> Arc<Self> {
        let (tasks, rx) = unbounded();
        Arc::new(Self {
            tasks,
            pending: Mutex::new(Some(rx)),
            stage: Mutex::new(stage),
            owner: thread::current().id(),
            open: AtomicBool::new(true),
            ticks: AtomicU64::new(0),
        })
    }

    /// Appends a stage mutation. Never blocks; no result is observable.
    ///
    /// After shutdown the task is dropped (logged at debug level).
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.send(Action::Stage(Box::new(f)));
    }

    /// Appends a task that runs without the stage lock.
    ///
    /// This is the path for script-callback invocations: the callback may
    /// re-enter the queue (posting mutations, or blocking reads when on a
    /// worker thread) without deadlocking against the drain.
    pub fn post_detached<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Action::Detached(Box::new(f)));
    }

    /// Submits a task and blocks until the owner thread has executed it,
    /// returning the computed value.
    ///
    /// On the owner thread the task executes inline, synchronously,
    /// bypassing the queue. On worker threads the call parks until the
    /// next drain reaches the task.
    ///
    /// # Errors
    ///
    /// [`QueueError::ShutDown`] if the queue is closed (before or while
    /// waiting); [`QueueError::TaskFailed`] if the task panicked on the
    /// owner thread.
    pub fn call<R, F>(&self, f: F) -> QueueResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        self.call_inner(f, None)
    }

    /// Like [`ActionQueue::call`], but bounds the caller's wait.
    ///
    /// The bound limits the *wait*, not the task: a timed-out task stays
    /// queued, still runs at the next drain, and its late result is
    /// discarded.
    ///
    /// # Errors
    ///
    /// [`QueueError::Timeout`] when the bound elapses first, otherwise as
    /// [`ActionQueue::call`].
    pub fn call_timeout<R, F>(&self, f: F, timeout: Duration) -> QueueResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        self.call_inner(f, Some(timeout))
    }

    fn call_inner<R, F>(&self, f: F, timeout: Option<Duration>) -> QueueResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        if !self.open.load(Ordering::Acquire) {
            return Err(QueueError::ShutDown);
        }

        if thread::current().id() == self.owner {
            // Inline execution. The stage lock is free here: the drain
            // releases it around detached tasks, and stage tasks never
            // issue blocking calls.
            let mut stage = self.stage.lock();
            return Ok(f(&mut stage));
        }

        let (result_tx, result_rx) = bounded::<QueueResult<R>>(1);
        let task = Action::Stage(Box::new(move |stage: &mut S| {
            let outcome = catch_unwind(AssertUnwindSafe(|| f(stage)));
            // A caller that timed out dropped its receiver; the late
            // result is discarded.
            let _ = result_tx.send(outcome.map_err(|payload| QueueError::TaskFailed {
                reason: panic_message(payload.as_ref()),
            }));
        }));

        if self.tasks.send(task).is_err() {
            return Err(QueueError::ShutDown);
        }

        match timeout {
            Some(bound) => match result_rx.recv_timeout(bound) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(QueueError::Timeout),
                Err(RecvTimeoutError::Disconnected) => Err(QueueError::ShutDown),
            },
            None => match result_rx.recv() {
                Ok(result) => result,
                Err(_) => Err(QueueError::ShutDown),
            },
        }
    }

    /// Executes all tasks queued so far, strictly in arrival order.
    ///
    /// Owner-thread only; called once per tick. Tasks submitted while the
    /// drain runs are left for the next drain. A panicking task is logged
    /// and does not stop the remaining tasks.
    ///
    /// Returns the number of tasks executed.
    pub fn drain(&self) -> usize {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "drain called off the owner thread"
        );

        let batch: Vec<Action<S>> = {
            let pending = self.pending.lock();
            let Some(rx) = pending.as_ref() else {
                return 0;
            };
            rx.try_iter().collect()
        };

        let executed = batch.len();
        for action in batch {
            let outcome = match action {
                Action::Stage(task) => catch_unwind(AssertUnwindSafe(|| {
                    let mut stage = self.stage.lock();
                    task(&mut stage);
                })),
                Action::Detached(task) => catch_unwind(AssertUnwindSafe(task)),
            };
            if let Err(payload) = outcome {
                tracing::error!(
                    "queued task panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }

        self.ticks.fetch_add(1, Ordering::Relaxed);
        executed
    }

    /// Grants the owner thread direct access to the stage.
    ///
    /// This is the native side of the boundary: building widgets, raising
    /// events, rendering. Worker threads must go through tasks instead.
    ///
    /// # Panics
    ///
    /// Panics when called off the owner thread.
    pub fn with_stage<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "stage accessed off the owner thread"
        );
        let mut stage = self.stage.lock();
        f(&mut stage)
    }

    /// Closes the queue.
    ///
    /// Idempotent. Pending tasks are dropped, which disconnects their
    /// result channels and wakes blocked callers with
    /// [`QueueError::ShutDown`]; future submissions fail fast.
    pub fn shutdown(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }

        let mut dropped = 0usize;
        if let Some(rx) = self.pending.lock().take() {
            while rx.try_recv().is_ok() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!("queue shut down, {} pending task(s) dropped", dropped);
        }
    }

    /// Returns true until [`ActionQueue::shutdown`] runs.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Number of tasks waiting for the next drain.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().as_ref().map_or(0, Receiver::len)
    }

    /// Number of completed drains.
    #[inline]
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn send(&self, action: Action<S>) {
        if !self.open.load(Ordering::Acquire) {
            tracing::debug!("task dropped: queue is shut down");
            return;
        }
        if self.tasks.send(action).is_err() {
            tracing::debug!("task dropped: queue is shut down");
        }
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_across_a_worker_thread() {
        let queue = ActionQueue::new(Vec::<u32>::new());

        let producer = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            for value in 0..100u32 {
                producer.post(move |stage| stage.push(value));
            }
        });
        worker.join().unwrap();

        assert_eq!(queue.drain(), 100);
        queue.with_stage(|stage| {
            let expected: Vec<u32> = (0..100).collect();
            assert_eq!(*stage, expected);
        });
    }

    #[test]
    fn test_call_returns_the_computed_value() {
        let queue = ActionQueue::new(41i32);

        let remote = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            remote.call(|stage| {
                *stage += 1;
                *stage
            })
        });

        while !worker.is_finished() {
            queue.drain();
            thread::yield_now();
        }
        assert_eq!(worker.join().unwrap(), Ok(42));
    }

    #[test]
    fn test_call_on_the_owner_thread_runs_inline() {
        let queue = ActionQueue::new(7i32);

        // No drain happens; the result is available immediately.
        let value = queue.call(|stage| *stage * 2);
        assert_eq!(value, Ok(14));
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_call_timeout_bounds_the_wait_not_the_task() {
        let queue = ActionQueue::new(0i32);

        let remote = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            remote.call_timeout(
                |stage| {
                    *stage = 99;
                },
                Duration::from_millis(20),
            )
        });

        // Nobody drains, so the caller times out...
        assert_eq!(worker.join().unwrap(), Err(QueueError::Timeout));

        // ...but the task is still queued and still runs.
        assert_eq!(queue.drain(), 1);
        queue.with_stage(|stage| assert_eq!(*stage, 99));
    }

    #[test]
    fn test_a_panicking_task_does_not_stop_the_drain() {
        let queue = ActionQueue::new(Vec::<&'static str>::new());

        queue.post(|stage| stage.push("first"));
        queue.post(|_stage| panic!("scripted misbehavior"));
        queue.post(|stage| stage.push("last"));

        assert_eq!(queue.drain(), 3);
        queue.with_stage(|stage| assert_eq!(*stage, vec!["first", "last"]));
    }

    #[test]
    fn test_call_reports_a_panicking_task_to_the_caller() {
        let queue = ActionQueue::new(());

        let remote = Arc::clone(&queue);
        let worker = thread::spawn(move || remote.call::<(), _>(|_stage| panic!("boom")));

        while !worker.is_finished() {
            queue.drain();
            thread::yield_now();
        }

        match worker.join().unwrap() {
            Err(QueueError::TaskFailed { reason }) => assert!(reason.contains("boom")),
            other => panic!("expected TaskFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_shutdown_wakes_a_blocked_caller() {
        let queue = ActionQueue::new(0i32);

        let remote = Arc::clone(&queue);
        let worker = thread::spawn(move || remote.call(|stage| *stage));

        // Wait until the worker's task has arrived, then close the queue.
        while queue.pending_count() == 0 {
            thread::yield_now();
        }
        queue.shutdown();

        assert_eq!(worker.join().unwrap(), Err(QueueError::ShutDown));
    }

    #[test]
    fn test_shutdown_fails_fast_and_drops_posts() {
        let queue = ActionQueue::new(0i32);
        queue.shutdown();
        queue.shutdown(); // idempotent

        assert!(!queue.is_open());
        assert_eq!(queue.call(|stage| *stage), Err(QueueError::ShutDown));

        queue.post(|stage| *stage = 1);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_tasks_posted_during_a_drain_run_next_tick() {
        let queue = ActionQueue::new(Vec::<u32>::new());

        let requeue = Arc::clone(&queue);
        queue.post(move |stage| {
            stage.push(1);
            requeue.post(|stage| stage.push(2));
        });

        assert_eq!(queue.drain(), 1);
        queue.with_stage(|stage| assert_eq!(*stage, vec![1]));

        assert_eq!(queue.drain(), 1);
        queue.with_stage(|stage| assert_eq!(*stage, vec![1, 2]));
    }

    #[test]
    fn test_detached_tasks_keep_arrival_order() {
        let queue = ActionQueue::new(Vec::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        queue.post(|stage| stage.push(1));
        let record = Arc::clone(&seen);
        queue.post_detached(move || record.lock().push(2));
        queue.post(|stage| stage.push(3));

        assert_eq!(queue.drain(), 3);
        queue.with_stage(|stage| assert_eq!(*stage, vec![1, 3]));
        assert_eq!(*seen.lock(), vec![2]);
    }
}
