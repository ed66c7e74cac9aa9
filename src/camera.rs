#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{MAX_SCALE, MIN_SCALE, ZOOM_STEP};

/// A point in screen, viewport, or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn minus(self, other: Point) -> Point {
        Point { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Camera state for pan/zoom on the unbounded canvas.
///
/// `pan_x` / `pan_y` are in screen pixels relative to the viewport origin.
/// `scale` is a zoom factor (1.0 = no zoom), kept within
/// [`MIN_SCALE`]..=[`MAX_SCALE`].
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point to world coordinates.
    ///
    /// `origin` is the screen position of the viewport's top-left corner.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point, origin: Point) -> Point {
        let local = screen.minus(origin);
        Point {
            x: (local.x - self.pan_x) / self.scale,
            y: (local.y - self.pan_y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point, origin: Point) -> Point {
        Point {
            x: world.x * self.scale + self.pan_x + origin.x,
            y: world.y * self.scale + self.pan_y + origin.y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Zoom by `notches` wheel steps while keeping the world point under
    /// `screen` fixed on screen. Positive notches zoom in.
    ///
    /// Each notch multiplies the scale by [`ZOOM_STEP`], so fractional
    /// notches from trackpads compose smoothly. Returns `false` when the
    /// scale is already pinned at the limit, or `notches` is not finite, and
    /// nothing changed.
    pub fn zoom_at(&mut self, screen: Point, origin: Point, notches: f64) -> bool {
        if !notches.is_finite() {
            return false;
        }
        let world = self.screen_to_world(screen, origin);
        let scale = (self.scale * ZOOM_STEP.powf(notches)).clamp(MIN_SCALE, MAX_SCALE);
        if (scale - self.scale).abs() < f64::EPSILON {
            return false;
        }
        let local = screen.minus(origin);
        self.scale = scale;
        self.pan_x = local.x - world.x * scale;
        self.pan_y = local.y - world.y * scale;
        true
    }

    /// Set the scale directly, clamped to the allowed range.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Anchor for a pan gesture starting at `screen`.
    #[must_use]
    pub fn pan_anchor(&self, screen: Point) -> Point {
        Point { x: screen.x - self.pan_x, y: screen.y - self.pan_y }
    }

    /// Continue a pan gesture: `pan = pointer - anchor`. Unclamped.
    pub fn pan_to(&mut self, screen: Point, anchor: Point) {
        self.pan_x = screen.x - anchor.x;
        self.pan_y = screen.y - anchor.y;
    }
}
