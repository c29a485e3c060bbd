//! # Native Event Hooks
//!
//! A hook is the native side of an event: a slot holding at most one
//! delegate. Binding replaces whatever was there; clearing an empty slot
//! is a no-op. Raising happens on the owner thread, synchronously, from
//! native code.
//!
//! The one-delegate rule is what makes re-subscription idempotent: there
//! is no list to accumulate duplicates in.

/// Single-delegate event slot with a fixed argument shape.
pub struct NativeHook<A> {
    delegate: Option<Box<dyn FnMut(&A) + Send>>,
}

impl<A> NativeHook<A> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self { delegate: None }
    }

    /// Installs a delegate, replacing any previous one.
    ///
    /// Returns true if a previous delegate was displaced.
    pub fn bind(&mut self, delegate: Box<dyn FnMut(&A) + Send>) -> bool {
        self.delegate.replace(delegate).is_some()
    }

    /// Removes the delegate. No-op when the slot is already empty.
    pub fn clear(&mut self) {
        self.delegate = None;
    }

    /// Returns true while a delegate is installed.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.delegate.is_some()
    }

    /// Fires the event.
    ///
    /// Called by native code on the owner thread. Does nothing when the
    /// slot is empty.
    pub fn raise(&mut self, args: &A) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate(args);
        }
    }
}

impl<A> Default for NativeHook<A> {
    fn default() -> Self {
        Self::new()
    }
}
