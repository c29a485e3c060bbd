//! # MARIONETTE
//!
//! Scripting bridge for applications whose UI state is owned by one
//! thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          MARIONETTE                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌───────────────┐      ┌───────────────┐     ┌─────────────┐  │
//! │  │ marionette_ui │      │ marionette_   │     │ marionette_ │  │
//! │  │               │      │ bridge        │     │ core        │  │
//! │  │ • Stage       │<─────│ • Proxies     │────>│ • Queue     │  │
//! │  │ • Widgets     │      │ • EventBridge │     │ • Liveness  │  │
//! │  │ • Hooks       │      │ • Scheduler   │     │ • Errors    │  │
//! │  └───────────────┘      └───────────────┘     └─────────────┘  │
//! │           ▲                                          ▲          │
//! │           └───────────── Host (this crate) ──────────┘          │
//! │                      config + tick loop                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML host configuration, loaded once at startup
//! - `host`: the owner-thread tick loop draining the queue

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod host;

// Re-export the layers
pub use marionette_bridge as bridge;
pub use marionette_core as core;
pub use marionette_ui as ui;

// Re-export commonly used types
pub use config::{ConfigError, HostConfig};
pub use host::{Host, HostStats};
