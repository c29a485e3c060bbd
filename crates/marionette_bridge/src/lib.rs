//! # MARIONETTE Bridge
//!
//! The boundary between scripts and the stage.
//!
//! ## Control flow
//!
//! ```text
//! script calls proxy ──> liveness check ──> task on the action queue
//!                                                 │
//!                              owner thread drains│per tick
//!                                                 ▼
//!                                        &mut Stage (real widgets)
//!
//! native event fires (owner thread)
//!   └─> bound hook delegate ──> CallbackScheduler ──> queued invocation
//!                                                     of the script
//!                                                     callable
//! ```
//!
//! Everything script-visible funnels through the queue, including work
//! that already starts on the owner thread; one code path, no special
//! cases.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod events;
pub mod proxy;
pub mod scheduler;
pub mod value;

use std::sync::Arc;

use marionette_core::ActionQueue;
use marionette_ui::Stage;

/// The shared handle every bridge component holds: the action queue that
/// owns the stage.
pub type StageQueue = Arc<ActionQueue<Stage>>;

pub use events::{BridgeError, EventBinding, EventBridge, EventTable};
pub use proxy::{ButtonProxy, ChoiceProxy, WidgetProxy, WindowProxy};
pub use scheduler::CallbackScheduler;
pub use value::{ScriptCallable, ScriptError, ScriptValue};
