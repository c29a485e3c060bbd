//! # The Stage
//!
//! Owner-thread widget tree plus the window registry.
//!
//! Disposal is the one structural operation with teeth: removing a widget
//! removes its whole subtree, and every removed widget has its shared
//! [`Liveness`] retired so proxies on worker threads go permanently stale.
//! Native hooks die with their widget, which is what keeps event
//! subscriptions from outliving the thing they observe.

use std::collections::HashMap;

use marionette_core::Liveness;

use crate::widget::{Widget, WidgetId, Window};

/// The owner thread's widget tree.
pub struct Stage {
    /// Widgets indexed by ID.
    widgets: HashMap<WidgetId, Box<dyn Widget>>,
    /// Top-level widget IDs.
    roots: Vec<WidgetId>,
    /// Parent-child relationships.
    children: HashMap<WidgetId, Vec<WidgetId>>,
    /// ID counter for generating unique IDs.
    next_id: u64,
    /// Viewport size used for centering top-level windows.
    viewport: (i32, i32),
    /// One-instance-per-kind window bookkeeping.
    registry: WindowRegistry,
}

impl Stage {
    /// Creates an empty stage.
    ///
    /// The registry is injected rather than reached through a global; the
    /// application decides how many registries exist.
    #[must_use]
    pub fn new(viewport_width: i32, viewport_height: i32, registry: WindowRegistry) -> Self {
        Self {
            widgets: HashMap::with_capacity(256),
            roots: Vec::with_capacity(16),
            children: HashMap::with_capacity(256),
            next_id: 1,
            viewport: (viewport_width, viewport_height),
            registry,
        }
    }

    /// Generates a new unique widget ID.
    pub fn next_id(&mut self) -> WidgetId {
        let id = WidgetId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Returns the viewport size.
    #[must_use]
    pub fn viewport(&self) -> (i32, i32) {
        self.viewport
    }

    /// Registers a top-level widget.
    pub fn add_root(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        let id = widget.state().id;
        self.widgets.insert(id, widget);
        self.roots.push(id);
        self.children.insert(id, Vec::new());
        id
    }

    /// Adds a child widget under a parent.
    pub fn add_child(&mut self, parent: WidgetId, mut widget: Box<dyn Widget>) -> WidgetId {
        let id = widget.state().id;
        widget.state_mut().parent = Some(parent);

        self.widgets.insert(id, widget);
        self.children.entry(parent).or_default().push(id);
        self.children.insert(id, Vec::new());
        id
    }

    /// Gets a widget by ID.
    #[must_use]
    pub fn widget(&self, id: WidgetId) -> Option<&dyn Widget> {
        self.widgets.get(&id).map(Box::as_ref)
    }

    /// Gets mutable access to a widget.
    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut (dyn Widget + '_)> {
        self.widgets
            .get_mut(&id)
            .map(|widget| &mut **widget as &mut dyn Widget)
    }

    /// Gets a widget downcast to its concrete type.
    #[must_use]
    pub fn widget_as<W: Widget + 'static>(&self, id: WidgetId) -> Option<&W> {
        self.widgets
            .get(&id)
            .and_then(|widget| widget.as_any().downcast_ref())
    }

    /// Gets mutable access to a widget's concrete type.
    pub fn widget_as_mut<W: Widget + 'static>(&mut self, id: WidgetId) -> Option<&mut W> {
        self.widgets
            .get_mut(&id)
            .and_then(|widget| widget.as_any_mut().downcast_mut())
    }

    /// Returns a clone of a widget's liveness flag, for building proxies.
    #[must_use]
    pub fn liveness_of(&self, id: WidgetId) -> Option<Liveness> {
        self.widgets
            .get(&id)
            .map(|widget| widget.state().liveness.clone())
    }

    /// Returns the children of a widget.
    #[must_use]
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Returns all top-level widgets.
    #[must_use]
    pub fn roots(&self) -> &[WidgetId] {
        &self.roots
    }

    /// Number of widgets on the stage.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Returns true when the stage has no widgets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Returns all widget IDs in depth-first order.
    pub fn iter_dfs(&self) -> impl Iterator<Item = WidgetId> + '_ {
        StageDfsIterator {
            stage: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Destroys a widget and its whole subtree.
    ///
    /// Every removed widget has its liveness retired, so proxies observe
    /// the disposal before the memory is gone. Returns true if the widget
    /// existed.
    pub fn dispose(&mut self, id: WidgetId) -> bool {
        if !self.widgets.contains_key(&id) {
            return false;
        }

        // Unlink from the parent before tearing down the subtree.
        if let Some(parent) = self.widgets.get(&id).and_then(|w| w.state().parent) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|&child| child != id);
            }
        }
        self.roots.retain(|&root| root != id);

        let mut removed = Vec::new();
        self.remove_subtree(id, &mut removed);
        self.registry.forget_ids(&removed);
        true
    }

    fn remove_subtree(&mut self, id: WidgetId, removed: &mut Vec<WidgetId>) {
        if let Some(children) = self.children.remove(&id) {
            for child in children {
                self.remove_subtree(child, removed);
            }
        }
        if let Some(widget) = self.widgets.remove(&id) {
            widget.state().liveness.retire();
            removed.push(id);
        }
    }

    /// Moves a widget under a new parent.
    ///
    /// Refused (returning false) when either widget is missing, when the
    /// widget and parent are the same, or when the move would make the
    /// widget an ancestor of itself.
    pub fn reparent(&mut self, id: WidgetId, new_parent: WidgetId) -> bool {
        if id == new_parent
            || !self.widgets.contains_key(&id)
            || !self.widgets.contains_key(&new_parent)
            || self.subtree_contains(id, new_parent)
        {
            return false;
        }

        if let Some(old_parent) = self.widgets.get(&id).and_then(|w| w.state().parent) {
            if let Some(siblings) = self.children.get_mut(&old_parent) {
                siblings.retain(|&child| child != id);
            }
        }
        self.roots.retain(|&root| root != id);

        if let Some(widget) = self.widgets.get_mut(&id) {
            widget.state_mut().parent = Some(new_parent);
        }
        self.children.entry(new_parent).or_default().push(id);
        true
    }

    fn subtree_contains(&self, root: WidgetId, needle: WidgetId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id == needle {
                return true;
            }
            if let Some(children) = self.children.get(&id) {
                stack.extend(children.iter().copied());
            }
        }
        false
    }

    /// Centers a top-level window in the viewport.
    ///
    /// No-op for child widgets and for anything that is not a window.
    pub fn center_window(&mut self, id: WidgetId) {
        let (viewport_width, viewport_height) = self.viewport;
        if let Some(window) = self.widget_as_mut::<Window>(id) {
            if window.state().parent.is_none() {
                window.center_in(viewport_width, viewport_height);
            }
        }
    }

    /// Returns the existing window of this kind, or builds one.
    ///
    /// "One instance per window kind": repeated requests for the same kind
    /// return the same widget until it is disposed, after which the
    /// factory runs again.
    pub fn singleton_window(
        &mut self,
        kind: &str,
        factory: impl FnOnce(WidgetId) -> Window,
    ) -> WidgetId {
        if let Some(id) = self.registry.lookup(kind) {
            if self.widgets.contains_key(&id) {
                return id;
            }
        }

        let id = self.next_id();
        let window = factory(id);
        self.add_root(Box::new(window));
        self.registry.record(kind, id);
        id
    }
}

/// Depth-first iterator over the stage.
struct StageDfsIterator<'a> {
    stage: &'a Stage,
    stack: Vec<WidgetId>,
}

impl Iterator for StageDfsIterator<'_> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;

        // Push children in reverse order so they're visited left-to-right.
        if let Some(children) = self.stage.children.get(&id) {
            for &child in children.iter().rev() {
                self.stack.push(child);
            }
        }

        Some(id)
    }
}

/// One-instance-per-kind window bookkeeping.
///
/// This replaces the usual static window manager: the registry is a plain
/// value handed to [`Stage::new`], so tests and multi-stage applications
/// get their own.
#[derive(Default)]
pub struct WindowRegistry {
    kinds: HashMap<String, WidgetId>,
}

impl WindowRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Returns the recorded window for a kind, if any.
    #[must_use]
    pub fn lookup(&self, kind: &str) -> Option<WidgetId> {
        self.kinds.get(kind).copied()
    }

    /// Records the window for a kind, displacing any previous entry.
    pub fn record(&mut self, kind: &str, id: WidgetId) {
        self.kinds.insert(kind.to_string(), id);
    }

    /// Drops every kind entry pointing at one of the given widgets.
    pub fn forget_ids(&mut self, ids: &[WidgetId]) {
        self.kinds.retain(|_, id| !ids.contains(id));
    }
}
