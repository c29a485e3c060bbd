//! # Event Table and Bridge
//!
//! Wiring between native hooks and script callables.
//!
//! The table is data, not generated code: a map from event names to
//! (subscribe, unsubscribe, probe) functions with the argument adapter
//! baked into the subscribe side. It is built once at startup and can be
//! extended by the host; nothing here inspects attributes or types at
//! runtime.
//!
//! Per (widget, event) slot the bridge maintains at most one native
//! delegate:
//!
//! ```text
//! Unsubscribed ──subscribe(callable)──> Subscribed(callable)
//! Subscribed(A) ──subscribe(B)──> Subscribed(B)      (A unregistered first)
//! Subscribed(_) ──subscribe(non-callable)──> Unsubscribed
//! Unsubscribed ──unsubscribe──> Unsubscribed          (no-op, not an error)
//! ```
//!
//! When the native event fires, the delegate forwards the adapted argument
//! to the [`CallbackScheduler`](crate::CallbackScheduler) instead of
//! invoking the callable inline; script code only ever runs out of the
//! queue, even though the delegate itself is already on the owner thread.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use marionette_core::QueueError;
use marionette_ui::{Button, ChoiceBox, Stage, WidgetId, Window};

use crate::scheduler::CallbackScheduler;
use crate::value::ScriptValue;
use crate::StageQueue;

/// Errors surfaced by bridge operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The event name is not present in the table.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The underlying blocking queue operation failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Delivery function handed to a subscribe entry; called with the already
/// adapted argument each time the native event fires.
pub type ForwardFn = Box<dyn FnMut(ScriptValue) + Send>;

/// One table entry: how to attach to, detach from, and probe one named
/// event on one widget type.
#[derive(Clone, Copy)]
pub struct EventBinding {
    subscribe: fn(&mut Stage, WidgetId, ForwardFn) -> bool,
    unsubscribe: fn(&mut Stage, WidgetId) -> bool,
    is_bound: fn(&Stage, WidgetId) -> bool,
}

impl EventBinding {
    /// Builds a table entry from its three functions.
    ///
    /// `subscribe` installs a delegate (replacing any previous one) and
    /// returns false when the widget is missing or of the wrong type;
    /// `unsubscribe` clears the slot; `is_bound` reports whether a
    /// delegate is installed.
    #[must_use]
    pub fn new(
        subscribe: fn(&mut Stage, WidgetId, ForwardFn) -> bool,
        unsubscribe: fn(&mut Stage, WidgetId) -> bool,
        is_bound: fn(&Stage, WidgetId) -> bool,
    ) -> Self {
        Self {
            subscribe,
            unsubscribe,
            is_bound,
        }
    }
}

// ============================================================================
// Standard entries
// ============================================================================

fn window_closed_subscribe(stage: &mut Stage, id: WidgetId, mut forward: ForwardFn) -> bool {
    match stage.widget_as_mut::<Window>(id) {
        Some(window) => {
            window
                .on_closed
                .bind(Box::new(move |_args| forward(ScriptValue::Null)));
            true
        }
        None => false,
    }
}

fn window_closed_unsubscribe(stage: &mut Stage, id: WidgetId) -> bool {
    match stage.widget_as_mut::<Window>(id) {
        Some(window) => {
            window.on_closed.clear();
            true
        }
        None => false,
    }
}

fn window_closed_is_bound(stage: &Stage, id: WidgetId) -> bool {
    stage
        .widget_as::<Window>(id)
        .is_some_and(|window| window.on_closed.is_bound())
}

fn choice_selected_subscribe(stage: &mut Stage, id: WidgetId, mut forward: ForwardFn) -> bool {
    match stage.widget_as_mut::<ChoiceBox>(id) {
        Some(choice) => {
            choice
                .on_selected
                .bind(Box::new(move |args| {
                    forward(ScriptValue::Int(i64::from(args.index)));
                }));
            true
        }
        None => false,
    }
}

fn choice_selected_unsubscribe(stage: &mut Stage, id: WidgetId) -> bool {
    match stage.widget_as_mut::<ChoiceBox>(id) {
        Some(choice) => {
            choice.on_selected.clear();
            true
        }
        None => false,
    }
}

fn choice_selected_is_bound(stage: &Stage, id: WidgetId) -> bool {
    stage
        .widget_as::<ChoiceBox>(id)
        .is_some_and(|choice| choice.on_selected.is_bound())
}

fn button_pressed_subscribe(stage: &mut Stage, id: WidgetId, mut forward: ForwardFn) -> bool {
    match stage.widget_as_mut::<Button>(id) {
        Some(button) => {
            button
                .on_pressed
                .bind(Box::new(move |_args| forward(ScriptValue::Null)));
            true
        }
        None => false,
    }
}

fn button_pressed_unsubscribe(stage: &mut Stage, id: WidgetId) -> bool {
    match stage.widget_as_mut::<Button>(id) {
        Some(button) => {
            button.on_pressed.clear();
            true
        }
        None => false,
    }
}

fn button_pressed_is_bound(stage: &Stage, id: WidgetId) -> bool {
    stage
        .widget_as::<Button>(id)
        .is_some_and(|button| button.on_pressed.is_bound())
}

/// Startup-built map from event names to bindings.
pub struct EventTable {
    bindings: HashMap<&'static str, EventBinding>,
}

impl EventTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The stock events every stage understands.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register(
            "Closed",
            EventBinding::new(
                window_closed_subscribe,
                window_closed_unsubscribe,
                window_closed_is_bound,
            ),
        );
        table.register(
            "Selected",
            EventBinding::new(
                choice_selected_subscribe,
                choice_selected_unsubscribe,
                choice_selected_is_bound,
            ),
        );
        table.register(
            "Pressed",
            EventBinding::new(
                button_pressed_subscribe,
                button_pressed_unsubscribe,
                button_pressed_is_bound,
            ),
        );
        table
    }

    /// Adds or replaces an entry.
    pub fn register(&mut self, name: &'static str, binding: EventBinding) {
        self.bindings.insert(name, binding);
    }

    /// Looks up an entry by event name.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<EventBinding> {
        self.bindings.get(name).copied()
    }

    /// Iterates the registered event names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.keys().copied()
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Connects native hooks to script callables through the queue.
#[derive(Clone)]
pub struct EventBridge {
    queue: StageQueue,
    table: Arc<EventTable>,
    scheduler: CallbackScheduler,
}

impl EventBridge {
    /// Creates a bridge over the given queue and table.
    #[must_use]
    pub fn new(queue: StageQueue, table: Arc<EventTable>) -> Self {
        let scheduler = CallbackScheduler::new(Arc::clone(&queue));
        Self {
            queue,
            table,
            scheduler,
        }
    }

    /// Binds `value` as the handler for `event` on `widget`.
    ///
    /// Re-subscribing replaces the previous handler; subscribing a
    /// non-callable value clears the slot instead (scripts pass null to
    /// mean "stop telling me"). The actual hook mutation is queued, so it
    /// lands at the next drain.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownEvent`] when the event name is not in the
    /// table.
    pub fn subscribe(
        &self,
        widget: WidgetId,
        event: &str,
        value: ScriptValue,
    ) -> Result<(), BridgeError> {
        let binding = self
            .table
            .binding(event)
            .ok_or_else(|| BridgeError::UnknownEvent(event.to_string()))?;

        let Some(callable) = value.as_callable().cloned() else {
            tracing::debug!("non-callable handler for {event:?} clears the subscription");
            return self.unsubscribe(widget, event);
        };

        let scheduler = self.scheduler.clone();
        let event = event.to_string();
        self.queue.post(move |stage| {
            let forward: ForwardFn =
                Box::new(move |arg| scheduler.schedule(callable.clone(), arg));
            if !(binding.subscribe)(stage, widget, forward) {
                tracing::debug!("subscription to {event:?} dropped: widget {widget:?} is gone");
            }
        });
        Ok(())
    }

    /// Clears the handler for `event` on `widget`.
    ///
    /// Safe to call when nothing is subscribed; that is a no-op.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownEvent`] when the event name is not in the
    /// table.
    pub fn unsubscribe(&self, widget: WidgetId, event: &str) -> Result<(), BridgeError> {
        let binding = self
            .table
            .binding(event)
            .ok_or_else(|| BridgeError::UnknownEvent(event.to_string()))?;

        self.queue.post(move |stage| {
            let _ = (binding.unsubscribe)(stage, widget);
        });
        Ok(())
    }

    /// Reports whether a handler is currently installed.
    ///
    /// Blocking: answers from owner-thread-consistent state.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownEvent`] for names not in the table,
    /// [`BridgeError::Queue`] when the queue is shut down.
    pub fn is_subscribed(&self, widget: WidgetId, event: &str) -> Result<bool, BridgeError> {
        let binding = self
            .table
            .binding(event)
            .ok_or_else(|| BridgeError::UnknownEvent(event.to_string()))?;

        Ok(self
            .queue
            .call(move |stage| (binding.is_bound)(stage, widget))?)
    }
}
