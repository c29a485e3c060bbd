//! # MARIONETTE Core
//!
//! The owner-thread gate: everything in the application that scripts may
//! touch lives behind exactly one thread, and this crate is the only way
//! through.
//!
//! ## Architecture
//!
//! ```text
//! worker threads                       owner thread
//! ┌────────────┐   post/call   ┌──────────────────────────┐
//! │ script A   │ ────────────> │                          │
//! ├────────────┤               │  ActionQueue ── drain ──>│ &mut Stage
//! │ script B   │ ────────────> │                          │
//! └────────────┘               └──────────────────────────┘
//!        │  is_live (lock-free)          │ retire
//!        └───────────── Liveness ────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Single writer** - the stage value inside the queue is only ever
//!    mutated by the owner thread's drain (or inline calls on that thread)
//! 2. **FIFO, exactly once** - tasks run in arrival order, one drain per tick
//! 3. **Failure isolation** - a panicking task is logged and the drain
//!    keeps going

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod liveness;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use liveness::Liveness;
pub use queue::ActionQueue;
