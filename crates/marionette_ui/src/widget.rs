//! Core widget types: identity, geometry, shared state, and the concrete
//! controls scripts can reach.
//!
//! Geometry is integer pixels throughout; scripts never see floats.

use std::any::Any;

use marionette_core::Liveness;

use crate::hook::NativeHook;

/// Unique identifier for a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

impl WidgetId {
    /// Creates a new widget ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Integer bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// The zero rectangle.
    pub const ZERO: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Common widget state.
pub struct WidgetState {
    /// Widget identifier.
    pub id: WidgetId,
    /// Bounding rectangle.
    pub rect: Rect,
    /// Parent widget ID (None for top-level widgets).
    pub parent: Option<WidgetId>,
    /// Shared live/disposed flag; proxies hold clones of this.
    pub liveness: Liveness,
}

impl WidgetState {
    /// Creates state for a new, live widget.
    #[must_use]
    pub fn new(id: WidgetId) -> Self {
        Self {
            id,
            rect: Rect::ZERO,
            parent: None,
            liveness: Liveness::new(),
        }
    }

    /// Moves the widget. Both coordinates change together.
    #[inline]
    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Resizes the widget. Both dimensions change together.
    #[inline]
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.rect.width = width;
        self.rect.height = height;
    }
}

/// Base trait for all widgets on the stage.
pub trait Widget: Send {
    /// Returns the widget's common state.
    fn state(&self) -> &WidgetState;

    /// Returns mutable access to the widget's common state.
    fn state_mut(&mut self) -> &mut WidgetState;

    /// Upcast for type-specific operations.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for type-specific operations.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ============================================================================
// Event argument shapes
// ============================================================================

/// Arguments for a window-closed event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosedArgs;

/// Arguments for a choice-selected event.
#[derive(Debug, Clone, Copy)]
pub struct SelectedArgs {
    /// Index of the entry the user picked.
    pub index: i32,
}

/// Arguments for a button-pressed event.
#[derive(Debug, Clone, Copy, Default)]
pub struct PressedArgs;

// ============================================================================
// Window
// ============================================================================

/// A top-level window.
pub struct Window {
    state: WidgetState,
    title: String,
    /// Fired by native code when the user closes the window.
    pub on_closed: NativeHook<ClosedArgs>,
}

impl Window {
    /// Creates a window with the given title.
    #[must_use]
    pub fn new(id: WidgetId, title: impl Into<String>) -> Self {
        Self {
            state: WidgetState::new(id),
            title: title.into(),
            on_closed: NativeHook::new(),
        }
    }

    /// Returns the window title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replaces the window title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Centers the window in a viewport of the given size.
    pub fn center_in(&mut self, viewport_width: i32, viewport_height: i32) {
        let rect = self.state.rect;
        self.state
            .set_pos((viewport_width - rect.width) / 2, (viewport_height - rect.height) / 2);
    }
}

impl Widget for Window {
    fn state(&self) -> &WidgetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// ChoiceBox
// ============================================================================

/// A list control with a single selected entry.
pub struct ChoiceBox {
    state: WidgetState,
    items: Vec<String>,
    selected: i32,
    /// Fired by native code when the user picks an entry.
    pub on_selected: NativeHook<SelectedArgs>,
}

impl ChoiceBox {
    /// Creates a choice box with the given entries and no selection.
    #[must_use]
    pub fn new(id: WidgetId, items: Vec<String>) -> Self {
        Self {
            state: WidgetState::new(id),
            items,
            selected: -1,
            on_selected: NativeHook::new(),
        }
    }

    /// Returns the entries.
    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Returns the selected index, -1 when nothing is selected.
    #[must_use]
    pub fn selected_index(&self) -> i32 {
        self.selected
    }

    /// Sets the selection without firing the native event.
    ///
    /// Out-of-range indexes are ignored; -1 clears the selection.
    pub fn set_selected_index(&mut self, index: i32) {
        let len = i32::try_from(self.items.len()).unwrap_or(i32::MAX);
        if (-1..len).contains(&index) {
            self.selected = index;
        }
    }

    /// Native "the user picked an entry" operation: sets the selection and
    /// fires `on_selected`.
    pub fn choose(&mut self, index: i32) {
        self.set_selected_index(index);
        if self.selected == index {
            self.on_selected.raise(&SelectedArgs { index });
        }
    }
}

impl Widget for ChoiceBox {
    fn state(&self) -> &WidgetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// Button
// ============================================================================

/// A push button.
pub struct Button {
    state: WidgetState,
    label: String,
    /// Fired by native code when the user presses the button.
    pub on_pressed: NativeHook<PressedArgs>,
}

impl Button {
    /// Creates a button with the given label.
    #[must_use]
    pub fn new(id: WidgetId, label: impl Into<String>) -> Self {
        Self {
            state: WidgetState::new(id),
            label: label.into(),
            on_pressed: NativeHook::new(),
        }
    }

    /// Returns the button label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the button label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Native "the user pressed" operation: fires `on_pressed`.
    pub fn press(&mut self) {
        self.on_pressed.raise(&PressedArgs);
    }
}

impl Widget for Button {
    fn state(&self) -> &WidgetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
