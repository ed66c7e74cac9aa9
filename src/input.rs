//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture being tracked between
//! pointer-down and pointer-up, carrying the starting geometry needed to
//! compute deltas and to restore everything if the gesture is cancelled.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::EntityId;
use crate::hit::RailEnd;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Select, drag, pan and resize (default).
    #[default]
    Select,
    /// Click a source entity, then a target entity, to connect them.
    Connect,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether a click should toggle selection membership instead of
    /// replacing the selection.
    #[must_use]
    pub fn toggles_selection(self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Whether a connect click forces a parallel connection.
    #[must_use]
    pub fn forces_parallel(self) -> bool {
        self.alt
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key name as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.0 == "Delete" || self.0 == "Backspace"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// First endpoint picked with the connect tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnect {
    pub source: EntityId,
    /// World position of the click, used for a precise source anchor.
    pub pointer: Point,
}

/// Persistent UI state that outlives a single gesture.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Source picked by the connect tool, waiting for a target.
    pub pending_connect: Option<PendingConnect>,
    /// Rail highlighted as the snap target of the card being dragged.
    pub snap_preview: Option<EntityId>,
}

/// Internal state for the input state machine.
///
/// Each active variant carries what the gesture started from, so a move can
/// be applied as an offset from the start and a cancel can put it back.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the canvas.
    Panning {
        /// Pointer position minus pan at gesture start.
        anchor: Point,
    },
    /// The user is moving a card.
    DraggingCard {
        id: EntityId,
        /// World-space pointer position at pointer-down.
        start_world: Point,
        orig_x: f64,
        orig_y: f64,
    },
    /// The user is moving a rail by its body.
    DraggingRail {
        id: EntityId,
        start_world: Point,
        orig_x: f64,
        orig_y: f64,
    },
    /// The user is dragging one of a rail's end handles.
    ResizingRail {
        id: EntityId,
        /// Which end is being dragged.
        end: RailEnd,
        start_world: Point,
        /// Start coordinate along the long axis at gesture start.
        orig_start: f64,
        orig_length: f64,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
