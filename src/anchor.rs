//! Connection anchor resolution.
//!
//! Two strategies: [`directional_anchors`] picks facing edges from the
//! relative position of two entities, and [`precise_anchor_from_pointer`]
//! picks the edge nearest to where the user clicked. Both return `None` when
//! an entity has no bounds; callers then fall back to
//! [`Anchor::CONTINUOUS`].

#[cfg(test)]
#[path = "anchor_test.rs"]
mod anchor_test;

use crate::bounds::{BoundsProvider, Rect};
use crate::camera::Point;
use crate::doc::{Anchor, Entity, MapDocument, Orientation, Rail};

/// Facing anchors for a connection from `source` to `target`.
///
/// Cards get the edge pair along the dominant axis of the center-to-center
/// delta (`Right`→`Left` when the target is further right, vertical pair on
/// ties). A rail end instead gets a precise anchor at the projection of the
/// other entity's center onto the rail, and the card facing it is left
/// `Continuous`.
#[must_use]
pub fn directional_anchors(
    doc: &MapDocument,
    bounds: &impl BoundsProvider,
    source: &str,
    target: &str,
) -> Option<[Anchor; 2]> {
    let source_entity = doc.entity(source)?;
    let target_entity = doc.entity(target)?;
    let source_rect = bounds.bounds(source)?;
    let target_rect = bounds.bounds(target)?;

    let from = source_rect.center();
    let to = target_rect.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    let edges = if dx.abs() > dy.abs() {
        if dx > 0.0 { [Anchor::RIGHT, Anchor::LEFT] } else { [Anchor::LEFT, Anchor::RIGHT] }
    } else if dy > 0.0 {
        [Anchor::BOTTOM, Anchor::TOP]
    } else {
        [Anchor::TOP, Anchor::BOTTOM]
    };

    let source_rail = source_entity.as_rail();
    let target_rail = target_entity.as_rail();
    if source_rail.is_none() && target_rail.is_none() {
        return Some(edges);
    }
    let source_anchor = match source_rail {
        Some(rail) => rail_projection(rail, source_rect, to),
        None => Anchor::CONTINUOUS,
    };
    let target_anchor = match target_rail {
        Some(rail) => rail_projection(rail, target_rect, from),
        None => Anchor::CONTINUOUS,
    };
    Some([source_anchor, target_anchor])
}

/// Precise anchor on `rail` at the projection of `toward` onto its long
/// axis, on the face that looks at `toward`. A zero-length rail has no
/// axis to project onto and gets [`Anchor::CONTINUOUS`].
fn rail_projection(rail: &Rail, rect: Rect, toward: Point) -> Anchor {
    let Some(rel) = rect.normalize(toward) else {
        return Anchor::CONTINUOUS;
    };
    let center = rect.center();
    match rail.orientation {
        Orientation::Horizontal => {
            if toward.y < center.y { Anchor::precise(rel.x, 0.0, 0.0, -1.0) } else { Anchor::precise(rel.x, 1.0, 0.0, 1.0) }
        }
        Orientation::Vertical => {
            if toward.x < center.x { Anchor::precise(0.0, rel.y, -1.0, 0.0) } else { Anchor::precise(1.0, rel.y, 1.0, 0.0) }
        }
    }
}

/// Anchor on `entity` nearest to a pointer at `pointer` (world space).
///
/// Rails get a precise anchor on the nearest long edge at the pointer's
/// position along the rail. Cards get the named edge with the smallest
/// distance, ties resolved in the order Top, Bottom, Left, Right.
#[must_use]
pub fn precise_anchor_from_pointer(pointer: Point, entity: Entity<'_>, bounds: &impl BoundsProvider) -> Option<Anchor> {
    let rect = bounds.bounds(entity.id())?;
    let rel = rect.normalize(pointer)?;
    match entity {
        Entity::Rail(rail) => Some(match rail.orientation {
            Orientation::Horizontal => {
                if rel.y < 0.5 { Anchor::precise(rel.x, 0.0, 0.0, -1.0) } else { Anchor::precise(rel.x, 1.0, 0.0, 1.0) }
            }
            Orientation::Vertical => {
                if rel.x < 0.5 { Anchor::precise(0.0, rel.y, -1.0, 0.0) } else { Anchor::precise(1.0, rel.y, 1.0, 0.0) }
            }
        }),
        Entity::Card(_) => {
            let px = rect.x + rel.x * rect.width;
            let py = rect.y + rel.y * rect.height;
            let candidates = [
                (py - rect.y, Anchor::TOP),
                (rect.bottom() - py, Anchor::BOTTOM),
                (px - rect.x, Anchor::LEFT),
                (rect.right() - px, Anchor::RIGHT),
            ];
            let mut best = candidates[0];
            for candidate in &candidates[1..] {
                if candidate.0 < best.0 {
                    best = *candidate;
                }
            }
            Some(best.1)
        }
    }
}

/// Anchors for a user-drawn connection.
///
/// Ends with a pointer position use [`precise_anchor_from_pointer`]; the
/// rest come from [`directional_anchors`]. Anything unresolvable becomes
/// [`Anchor::CONTINUOUS`].
#[must_use]
pub fn resolve_anchors(
    doc: &MapDocument,
    bounds: &impl BoundsProvider,
    source: &str,
    target: &str,
    pointers: [Option<Point>; 2],
) -> [Anchor; 2] {
    let from_pointer = |id: &str, pointer: Option<Point>| {
        let entity = doc.entity(id)?;
        precise_anchor_from_pointer(pointer?, entity, bounds)
    };
    let picked = [from_pointer(source, pointers[0]), from_pointer(target, pointers[1])];
    let fallback = directional_anchors(doc, bounds, source, target).unwrap_or([Anchor::CONTINUOUS; 2]);
    [picked[0].unwrap_or(fallback[0]), picked[1].unwrap_or(fallback[1])]
}
