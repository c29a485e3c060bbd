//! # MARIONETTE UI
//!
//! The stage: a widget tree owned by exactly one thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Stage                          │
//! │                                                      │
//! │   roots ──> Window ──> ChoiceBox                     │
//! │                   └──> Button                        │
//! │                                                      │
//! │   each widget: WidgetState (rect, parent, Liveness)  │
//! │              + NativeHook slots (one delegate max)   │
//! │                                                      │
//! │   WindowRegistry: one instance per window kind       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! Nothing in this crate synchronizes anything. The stage is plain mutable
//! data; the action queue in `marionette_core` is the only door, and the
//! owner thread holds the only key.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod hook;
pub mod stage;
pub mod widget;

pub use hook::NativeHook;
pub use stage::{Stage, WindowRegistry};
pub use widget::{
    Button, ChoiceBox, ClosedArgs, PressedArgs, Rect, SelectedArgs, Widget, WidgetId,
    WidgetState, Window,
};
