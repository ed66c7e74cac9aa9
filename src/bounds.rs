#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;

use crate::camera::Point;
use crate::doc::{Entity, MapDocument};

/// Width and height in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether `pt` lies inside the box, grown by `slop` on every side.
    #[must_use]
    pub fn contains(&self, pt: Point, slop: f64) -> bool {
        pt.x >= self.x - slop && pt.x <= self.right() + slop && pt.y >= self.y - slop && pt.y <= self.bottom() + slop
    }

    /// Position of `pt` relative to the box, `(0,0)` top-left to `(1,1)`
    /// bottom-right, clamped. `None` for a degenerate box.
    #[must_use]
    pub fn normalize(&self, pt: Point) -> Option<Point> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Point::new(
            ((pt.x - self.x) / self.width).clamp(0.0, 1.0),
            ((pt.y - self.y) / self.height).clamp(0.0, 1.0),
        ))
    }
}

/// Supplies entity bounding boxes to the geometry code.
///
/// A host that measures rendered elements can implement this directly;
/// `None` means the entity is not mounted and callers must fall back.
pub trait BoundsProvider {
    fn bounds(&self, id: &str) -> Option<Rect>;
}

/// Bounds taken from the stored document: card size when stored, otherwise
/// `default_card`; rails from their position, length and thickness.
pub struct DocBounds<'a> {
    doc: &'a MapDocument,
    default_card: Size,
}

impl<'a> DocBounds<'a> {
    #[must_use]
    pub fn new(doc: &'a MapDocument, default_card: Size) -> Self {
        Self { doc, default_card }
    }
}

impl BoundsProvider for DocBounds<'_> {
    fn bounds(&self, id: &str) -> Option<Rect> {
        match self.doc.entity(id)? {
            Entity::Card(card) => Some(card.rect(self.default_card)),
            Entity::Rail(rail) => Some(rail.rect()),
        }
    }
}
