#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::bounds::Size;
use crate::camera::{Camera, Point};
use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{EntityId, MapDocument, Orientation, Rail};

/// Which end of a rail a resize handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailEnd {
    /// Left end of a horizontal rail, top end of a vertical one.
    Start,
    /// Right end of a horizontal rail, bottom end of a vertical one.
    End,
}

/// Which part of an entity was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Card,
    Rail,
    RailHandle(RailEnd),
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: EntityId,
    pub part: HitPart,
}

/// Test what is under `world_pt`.
///
/// Rail resize handles take priority, then cards (last drawn first), then
/// rail bodies. Handle and rail slop is [`HANDLE_RADIUS_PX`] in screen
/// pixels, so thin rails stay grabbable when zoomed out.
#[must_use]
pub fn hit_test(world_pt: Point, doc: &MapDocument, card_size: Size, camera: &Camera) -> Option<Hit> {
    let slop = camera.screen_dist_to_world(HANDLE_RADIUS_PX);

    for rail in doc.rails.iter().rev() {
        let [start, end] = handle_points(rail);
        if distance(world_pt, start) <= slop {
            return Some(Hit { id: rail.id.clone(), part: HitPart::RailHandle(RailEnd::Start) });
        }
        if distance(world_pt, end) <= slop {
            return Some(Hit { id: rail.id.clone(), part: HitPart::RailHandle(RailEnd::End) });
        }
    }

    if let Some(card) = doc.nodes.iter().rev().find(|c| c.rect(card_size).contains(world_pt, 0.0)) {
        return Some(Hit { id: card.id.clone(), part: HitPart::Card });
    }

    doc.rails
        .iter()
        .rev()
        .find(|r| r.rect().contains(world_pt, slop))
        .map(|r| Hit { id: r.id.clone(), part: HitPart::Rail })
}

/// World positions of a rail's two resize handles, on its center line.
#[must_use]
pub fn handle_points(rail: &Rail) -> [Point; 2] {
    let rect = rail.rect();
    let center = rect.center();
    match rail.orientation {
        Orientation::Horizontal => [Point::new(rect.x, center.y), Point::new(rect.right(), center.y)],
        Orientation::Vertical => [Point::new(center.x, rect.y), Point::new(center.x, rect.bottom())],
    }
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
