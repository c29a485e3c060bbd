//! # Widget Proxies
//!
//! The handles scripts actually hold. A proxy references a widget by
//! identity (id + shared liveness flag); it never owns the widget and many
//! proxies may point at the same one.
//!
//! Every operation starts with a liveness check. A disposed widget is not
//! an error: reads answer with a documented default (0 for geometry, -1
//! for selection, empty for text) and mutators do nothing, because a
//! script cannot usefully react to "the window already closed".
//!
//! Mutations always go through the queue, even when the caller happens to
//! be the owner thread; one code path is correct from everywhere. Reads
//! block for owner-consistent state (and execute inline on the owner
//! thread). Composite setters such as [`WidgetProxy::set_pos`] travel as a
//! single task, so both fields change atomically relative to other queued
//! work.
//!
//! Liveness is checked *again* inside every queued task, via the flag and
//! the stage lookup; a widget disposed between the proxy's check and the
//! drain is a clean no-op.

use std::sync::Arc;
use std::time::Duration;

use marionette_core::{Liveness, QueueResult};
use marionette_ui::{Button, ChoiceBox, Stage, Widget, WidgetId, Window};

use crate::StageQueue;

/// Handle to one widget, valid only while the widget lives.
#[derive(Clone)]
pub struct WidgetProxy {
    queue: StageQueue,
    id: WidgetId,
    liveness: Liveness,
    timeout: Option<Duration>,
}

impl WidgetProxy {
    /// Creates a proxy from parts the owner side already has.
    #[must_use]
    pub fn new(queue: StageQueue, id: WidgetId, liveness: Liveness) -> Self {
        Self {
            queue,
            id,
            liveness,
            timeout: None,
        }
    }

    /// Builds a proxy for an existing widget.
    ///
    /// Blocking (inline on the owner thread). Returns `Ok(None)` when no
    /// such widget is on the stage.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking lookup.
    pub fn attach(queue: &StageQueue, id: WidgetId) -> QueueResult<Option<Self>> {
        let liveness = queue.call(move |stage| stage.liveness_of(id))?;
        Ok(liveness.map(|liveness| Self::new(Arc::clone(queue), id, liveness)))
    }

    /// Bounds the wait of this proxy's blocking reads.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The identity of the widget this proxy references.
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Returns true while the widget has not been disposed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }

    /// Left edge. Disposed: 0.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn x(&self) -> QueueResult<i32> {
        let id = self.id;
        self.read(0, move |stage| {
            stage.widget(id).map_or(0, |w| w.state().rect.x)
        })
    }

    /// Top edge. Disposed: 0.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn y(&self) -> QueueResult<i32> {
        let id = self.id;
        self.read(0, move |stage| {
            stage.widget(id).map_or(0, |w| w.state().rect.y)
        })
    }

    /// Width in pixels. Disposed: 0.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn width(&self) -> QueueResult<i32> {
        let id = self.id;
        self.read(0, move |stage| {
            stage.widget(id).map_or(0, |w| w.state().rect.width)
        })
    }

    /// Height in pixels. Disposed: 0.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn height(&self) -> QueueResult<i32> {
        let id = self.id;
        self.read(0, move |stage| {
            stage.widget(id).map_or(0, |w| w.state().rect.height)
        })
    }

    /// Moves the widget. Both coordinates land in one task.
    pub fn set_pos(&self, x: i32, y: i32) {
        self.mutate(move |stage, id| {
            if let Some(widget) = stage.widget_mut(id) {
                widget.state_mut().set_pos(x, y);
            }
        });
    }

    /// Resizes the widget. Both dimensions land in one task.
    pub fn set_size(&self, width: i32, height: i32) {
        self.mutate(move |stage, id| {
            if let Some(widget) = stage.widget_mut(id) {
                widget.state_mut().set_size(width, height);
            }
        });
    }

    /// Moves the widget under a new parent.
    pub fn reparent(&self, new_parent: WidgetId) {
        self.mutate(move |stage, id| {
            stage.reparent(id, new_parent);
        });
    }

    /// Destroys the widget and its subtree.
    ///
    /// The disposal itself happens on the owner thread, ordered after
    /// every task queued before this call; the proxy (and all its clones)
    /// go permanently stale.
    pub fn dispose(&self) {
        self.mutate(move |stage, id| {
            stage.dispose(id);
        });
    }

    /// Blocking read with a stale-handle default.
    fn read<R, F>(&self, stale_default: R, f: F) -> QueueResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Stage) -> R + Send + 'static,
    {
        if !self.liveness.is_live() {
            return Ok(stale_default);
        }
        match self.timeout {
            Some(bound) => self.queue.call_timeout(f, bound),
            None => self.queue.call(f),
        }
    }

    /// Queued mutation with the in-task liveness re-check.
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Stage, WidgetId) + Send + 'static,
    {
        if !self.liveness.is_live() {
            return;
        }
        let id = self.id;
        let liveness = self.liveness.clone();
        self.queue.post(move |stage| {
            if liveness.is_live() {
                f(stage, id);
            }
        });
    }
}

/// Typed proxy for a [`Window`].
#[derive(Clone)]
pub struct WindowProxy {
    widget: WidgetProxy,
}

impl WindowProxy {
    /// Builds a proxy for an existing window.
    ///
    /// Returns `Ok(None)` when the widget is missing or not a window.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking lookup.
    pub fn attach(queue: &StageQueue, id: WidgetId) -> QueueResult<Option<Self>> {
        let liveness = queue.call(move |stage| {
            stage
                .widget_as::<Window>(id)
                .map(|window| window.state().liveness.clone())
        })?;
        Ok(liveness.map(|liveness| Self {
            widget: WidgetProxy::new(Arc::clone(queue), id, liveness),
        }))
    }

    /// The untyped proxy for geometry and structural operations.
    #[must_use]
    pub fn as_widget(&self) -> &WidgetProxy {
        &self.widget
    }

    /// The window title. Disposed: empty string.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn title(&self) -> QueueResult<String> {
        let id = self.widget.id;
        self.widget.read(String::new(), move |stage| {
            stage
                .widget_as::<Window>(id)
                .map_or_else(String::new, |window| window.title().to_string())
        })
    }

    /// Replaces the window title.
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.widget.mutate(move |stage, id| {
            if let Some(window) = stage.widget_as_mut::<Window>(id) {
                window.set_title(title);
            }
        });
    }

    /// Centers the window in the stage viewport.
    pub fn center(&self) {
        self.widget.mutate(move |stage, id| {
            stage.center_window(id);
        });
    }
}

/// Typed proxy for a [`ChoiceBox`].
#[derive(Clone)]
pub struct ChoiceProxy {
    widget: WidgetProxy,
}

impl ChoiceProxy {
    /// Builds a proxy for an existing choice box.
    ///
    /// Returns `Ok(None)` when the widget is missing or not a choice box.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking lookup.
    pub fn attach(queue: &StageQueue, id: WidgetId) -> QueueResult<Option<Self>> {
        let liveness = queue.call(move |stage| {
            stage
                .widget_as::<ChoiceBox>(id)
                .map(|choice| choice.state().liveness.clone())
        })?;
        Ok(liveness.map(|liveness| Self {
            widget: WidgetProxy::new(Arc::clone(queue), id, liveness),
        }))
    }

    /// The untyped proxy for geometry and structural operations.
    #[must_use]
    pub fn as_widget(&self) -> &WidgetProxy {
        &self.widget
    }

    /// The selected index, -1 for no selection. Disposed: -1.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn selected_index(&self) -> QueueResult<i32> {
        let id = self.widget.id;
        self.widget.read(-1, move |stage| {
            stage
                .widget_as::<ChoiceBox>(id)
                .map_or(-1, ChoiceBox::selected_index)
        })
    }

    /// Sets the selection without firing the native event.
    pub fn set_selected_index(&self, index: i32) {
        self.widget.mutate(move |stage, id| {
            if let Some(choice) = stage.widget_as_mut::<ChoiceBox>(id) {
                choice.set_selected_index(index);
            }
        });
    }
}

/// Typed proxy for a [`Button`].
#[derive(Clone)]
pub struct ButtonProxy {
    widget: WidgetProxy,
}

impl ButtonProxy {
    /// Builds a proxy for an existing button.
    ///
    /// Returns `Ok(None)` when the widget is missing or not a button.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking lookup.
    pub fn attach(queue: &StageQueue, id: WidgetId) -> QueueResult<Option<Self>> {
        let liveness = queue.call(move |stage| {
            stage
                .widget_as::<Button>(id)
                .map(|button| button.state().liveness.clone())
        })?;
        Ok(liveness.map(|liveness| Self {
            widget: WidgetProxy::new(Arc::clone(queue), id, liveness),
        }))
    }

    /// The untyped proxy for geometry and structural operations.
    #[must_use]
    pub fn as_widget(&self) -> &WidgetProxy {
        &self.widget
    }

    /// The button label. Disposed: empty string.
    ///
    /// # Errors
    ///
    /// Queue errors from the blocking read.
    pub fn label(&self) -> QueueResult<String> {
        let id = self.widget.id;
        self.widget.read(String::new(), move |stage| {
            stage
                .widget_as::<Button>(id)
                .map_or_else(String::new, |button| button.label().to_string())
        })
    }

    /// Replaces the button label.
    pub fn set_label(&self, label: impl Into<String>) {
        let label = label.into();
        self.widget.mutate(move |stage, id| {
            if let Some(button) = stage.widget_as_mut::<Button>(id) {
                button.set_label(label);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::ActionQueue;
    use marionette_ui::{Widget, WindowRegistry};
    use std::thread;

    fn rig() -> (StageQueue, WidgetId) {
        let queue = ActionQueue::new(Stage::new(800, 600, WindowRegistry::new()));
        let window = queue.with_stage(|stage| {
            let id = stage.next_id();
            let mut window = Window::new(id, "main");
            window.state_mut().rect = marionette_ui::Rect::new(10, 20, 200, 100);
            stage.add_root(Box::new(window));
            id
        });
        (queue, window)
    }

    #[test]
    fn test_same_thread_write_then_read_observes_the_write() {
        let (queue, window) = rig();
        let proxy = WidgetProxy::attach(&queue, window).unwrap().unwrap();

        let worker = thread::spawn(move || {
            proxy.set_pos(5, 5);
            // The blocking read queues behind the mutation, so it sees it.
            proxy.x()
        });

        while !worker.is_finished() {
            queue.drain();
            thread::yield_now();
        }
        assert_eq!(worker.join().unwrap(), Ok(5));
    }

    #[test]
    fn test_disposed_widget_answers_with_defaults() {
        let (queue, window) = rig();
        let proxy = WidgetProxy::attach(&queue, window).unwrap().unwrap();

        queue.with_stage(|stage| {
            stage.dispose(window);
        });
        assert!(!proxy.is_live());

        // Mutations on a stale handle do not crash and change nothing.
        let worker = {
            let proxy = proxy.clone();
            thread::spawn(move || proxy.set_size(100, 100))
        };
        worker.join().unwrap();
        assert_eq!(queue.drain(), 0);

        assert_eq!(proxy.x(), Ok(0));
        assert_eq!(proxy.width(), Ok(0));
    }

    #[test]
    fn test_disposal_between_check_and_drain_is_a_no_op() {
        let (queue, window) = rig();
        let proxy = WidgetProxy::attach(&queue, window).unwrap().unwrap();

        // The liveness check passes, the task is queued...
        proxy.set_pos(99, 99);
        // ...then the owner disposes the widget before draining.
        queue.with_stage(|stage| {
            stage.dispose(window);
        });
        queue.drain();

        queue.with_stage(|stage| assert!(stage.is_empty()));
        assert_eq!(proxy.x(), Ok(0));
    }

    #[test]
    fn test_queued_dispose_runs_after_earlier_tasks() {
        let (queue, window) = rig();
        let proxy = WidgetProxy::attach(&queue, window).unwrap().unwrap();

        proxy.set_pos(1, 2);
        proxy.dispose();
        // Queued after the disposal: becomes a no-op.
        proxy.set_pos(7, 8);

        queue.drain();
        queue.with_stage(|stage| assert!(stage.is_empty()));
        assert!(!proxy.is_live());
    }

    #[test]
    fn test_typed_proxies_check_the_widget_type() {
        let (queue, window) = rig();

        assert!(WindowProxy::attach(&queue, window).unwrap().is_some());
        assert!(ChoiceProxy::attach(&queue, window).unwrap().is_none());
        assert!(WidgetProxy::attach(&queue, WidgetId::new(404))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_window_proxy_title_and_center() {
        let (queue, window) = rig();
        let proxy = WindowProxy::attach(&queue, window).unwrap().unwrap();

        proxy.set_title("renamed");
        proxy.center();
        queue.drain();

        assert_eq!(proxy.title(), Ok("renamed".to_string()));
        assert_eq!(proxy.as_widget().x(), Ok(300));
        assert_eq!(proxy.as_widget().y(), Ok(250));
    }

    #[test]
    fn test_choice_proxy_selection_roundtrip() {
        let (queue, window) = rig();
        let choice_id = queue.with_stage(|stage| {
            let id = stage.next_id();
            stage.add_child(
                window,
                Box::new(ChoiceBox::new(
                    id,
                    vec!["a".to_string(), "b".to_string()],
                )),
            );
            id
        });

        let proxy = ChoiceProxy::attach(&queue, choice_id).unwrap().unwrap();
        assert_eq!(proxy.selected_index(), Ok(-1));

        proxy.set_selected_index(1);
        queue.drain();
        assert_eq!(proxy.selected_index(), Ok(1));
    }

    #[test]
    fn test_reparent_through_the_proxy() {
        let (queue, window) = rig();
        let (other_window, button) = queue.with_stage(|stage| {
            let other = stage.next_id();
            stage.add_root(Box::new(Window::new(other, "second")));
            let button = stage.next_id();
            stage.add_child(window, Box::new(Button::new(button, "ok")));
            (other, button)
        });

        let proxy = WidgetProxy::attach(&queue, button).unwrap().unwrap();
        proxy.reparent(other_window);
        queue.drain();

        queue.with_stage(|stage| {
            assert_eq!(stage.children(window).len(), 0);
            assert_eq!(stage.children(other_window), &[button]);
            assert_eq!(
                stage.widget(button).unwrap().state().parent,
                Some(other_window)
            );
        });
    }
}
