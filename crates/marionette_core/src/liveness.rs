//! # Liveness Flags
//!
//! Every owner-thread entity carries one `Liveness`. Proxies on worker
//! threads read it before every operation; the owner thread retires it when
//! the entity is destroyed. Retirement is one-way: a flag never goes back
//! to live.
//!
//! Reads are lock-free. The Release store in [`Liveness::retire`] pairs
//! with the Acquire load in [`Liveness::is_live`], so a worker never
//! observes a stale "live" after disposal has completed on the owner
//! thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared live/disposed flag for one owner-thread entity.
///
/// Cloning is cheap and yields another handle to the *same* flag; a widget
/// and all proxies pointing at it share one allocation.
#[derive(Clone, Debug)]
pub struct Liveness {
    live: Arc<AtomicBool>,
}

impl Liveness {
    /// Creates a new flag in the live state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns true while the entity has not been disposed.
    ///
    /// Safe to call from any thread.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Marks the entity as disposed.
    ///
    /// Idempotent. Returns true if this call performed the transition,
    /// false if the flag was already retired. There is no way back to
    /// live.
    #[inline]
    pub fn retire(&self) -> bool {
        self.live.swap(false, Ordering::AcqRel)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
