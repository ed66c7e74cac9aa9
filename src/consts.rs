//! Shared numeric constants for the editor engine.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed zoom scale.
pub const MIN_SCALE: f64 = 0.2;

/// Largest allowed zoom scale.
pub const MAX_SCALE: f64 = 3.0;

/// Multiplicative zoom step applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;

/// Wheel delta (in pixels) that counts as one notch.
pub const WHEEL_NOTCH_PX: f64 = 100.0;

// ── Rails ───────────────────────────────────────────────────────

/// Cross-axis thickness of every rail, in world units.
pub const RAIL_THICKNESS: f64 = 10.0;

/// Length given to a newly added rail.
pub const DEFAULT_RAIL_LENGTH: f64 = 400.0;

/// Rails cannot be resized shorter than this.
pub const MIN_RAIL_LENGTH: f64 = 60.0;

/// Snap distance used when settings don't provide one.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 40.0;

/// Gap from a horizontal rail's `y` to the top of a card hanging from it.
pub const HORIZONTAL_RAIL_SNAP_OFFSET: f64 = 12.0;

/// Gap from a vertical rail's `x` to the left edge of a card resting on it.
pub const VERTICAL_RAIL_SNAP_OFFSET: f64 = 14.0;

// ── Cards ───────────────────────────────────────────────────────

/// Width of a card that has no stored width.
pub const DEFAULT_CARD_WIDTH: f64 = 240.0;

/// Height of a card that has no stored height.
pub const DEFAULT_CARD_HEIGHT: f64 = 160.0;

/// Screen-space offset from the viewport corner where new entities appear.
pub const NEW_ENTITY_OFFSET_PX: f64 = 40.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for rail resize handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

// ── Connector ───────────────────────────────────────────────────

/// Attempts made to detach a connector handle before giving up.
pub const DETACH_ATTEMPTS: usize = 3;
