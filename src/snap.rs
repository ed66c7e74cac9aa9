//! Rail snapping: locking dragged cards onto rails.
//!
//! A card can snap to a horizontal rail when its horizontal center lies
//! within the rail's span, and the distance from its top edge to the rail's
//! center line is within the threshold. Vertical rails use the vertical
//! center and the left edge. A snapped card sits at a fixed offset from the
//! rail and remembers it in `attached_rail`, so moving or resizing the rail
//! keeps the card flush.

#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use tracing::debug;

use crate::bounds::{Rect, Size};
use crate::consts::{HORIZONTAL_RAIL_SNAP_OFFSET, MIN_RAIL_LENGTH, VERTICAL_RAIL_SNAP_OFFSET};
use crate::doc::{Card, EntityId, MapDocument, Orientation, Rail};
use crate::hit::RailEnd;

const FLUSH_TOLERANCE: f64 = 1e-6;

/// Nearest eligible rail for a card.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapCandidate {
    pub rail_id: EntityId,
    pub distance: f64,
}

/// Find the nearest rail within `threshold` of a card occupying `card`.
///
/// Rails are scanned in order; on equal distance the first one wins.
#[must_use]
pub fn nearest_rail(rails: &[Rail], card: Rect, threshold: f64) -> Option<SnapCandidate> {
    let center = card.center();
    let mut best: Option<SnapCandidate> = None;
    for rail in rails {
        let (along, edge) = match rail.orientation {
            Orientation::Horizontal => (center.x, card.y),
            Orientation::Vertical => (center.y, card.x),
        };
        if !rail.spans(along) {
            continue;
        }
        let distance = (edge - rail.center_line()).abs();
        if best.as_ref().map_or(true, |b| distance < b.distance) {
            best = Some(SnapCandidate { rail_id: rail.id.clone(), distance });
        }
    }
    best.filter(|b| b.distance <= threshold)
}

/// Move `card` flush against `rail` and record the attachment.
pub fn attach(card: &mut Card, rail: &Rail) {
    match rail.orientation {
        Orientation::Horizontal => card.y = rail.y + HORIZONTAL_RAIL_SNAP_OFFSET,
        Orientation::Vertical => card.x = rail.x + VERTICAL_RAIL_SNAP_OFFSET,
    }
    card.attached_rail = Some(rail.id.clone());
}

/// Finish a card drag: snap to the nearest rail in range, or detach.
///
/// Returns the rail the card ended up attached to.
pub fn settle_card(doc: &mut MapDocument, card_id: &str, default_size: Size, threshold: f64) -> Option<EntityId> {
    let rect = doc.card(card_id)?.rect(default_size);
    let candidate = nearest_rail(&doc.rails, rect, threshold);
    let rail = candidate.and_then(|c| doc.rail(&c.rail_id).cloned());
    let card = doc.card_mut(card_id)?;
    match rail {
        Some(rail) => {
            attach(card, &rail);
            debug!(card = %card_id, rail = %rail.id, "card snapped to rail");
            Some(rail.id)
        }
        None => {
            if let Some(previous) = card.attached_rail.take() {
                debug!(card = %card_id, rail = %previous, "card detached from rail");
            }
            None
        }
    }
}

/// Re-flush every card attached to `rail_id` after the rail moved or was
/// resized. Returns the ids of the cards that were adjusted.
pub fn reflush_attached(doc: &mut MapDocument, rail_id: &str) -> Vec<EntityId> {
    let Some(rail) = doc.rail(rail_id).cloned() else {
        return Vec::new();
    };
    let mut moved = Vec::new();
    for card in &mut doc.nodes {
        if card.attached_rail.as_deref() == Some(rail_id) {
            attach(card, &rail);
            moved.push(card.id.clone());
        }
    }
    moved
}

/// Re-flush every attached card in the document.
pub fn reflush_all(doc: &mut MapDocument) -> usize {
    let rail_ids: Vec<EntityId> = doc.rails.iter().map(|r| r.id.clone()).collect();
    rail_ids.iter().map(|id| reflush_attached(doc, id).len()).sum()
}

/// Resize `rail` by dragging `end` a distance `delta` along its long axis,
/// starting from the extent it had when the gesture began.
///
/// The opposite end stays fixed and the length never drops below
/// [`MIN_RAIL_LENGTH`].
pub fn resize_rail(rail: &mut Rail, end: RailEnd, orig_start: f64, orig_length: f64, delta: f64) {
    let (start, length) = match end {
        RailEnd::Start => {
            let fixed_end = orig_start + orig_length;
            let start = (orig_start + delta).min(fixed_end - MIN_RAIL_LENGTH);
            (start, fixed_end - start)
        }
        RailEnd::End => (orig_start, (orig_length + delta).max(MIN_RAIL_LENGTH)),
    };
    rail.set_start(start);
    rail.set_length(length);
}

/// Whether `card` sits where [`attach`] would put it on `rail`.
#[must_use]
pub fn is_flush(card: &Card, rail: &Rail) -> bool {
    let (actual, expected) = match rail.orientation {
        Orientation::Horizontal => (card.y, rail.y + HORIZONTAL_RAIL_SNAP_OFFSET),
        Orientation::Vertical => (card.x, rail.x + VERTICAL_RAIL_SNAP_OFFSET),
    };
    (actual - expected).abs() < FLUSH_TOLERANCE
}

/// Detach cards in `ids` that a layout operation moved off their rail.
/// Returns the ids that were released.
pub fn release_unflushed(doc: &mut MapDocument, ids: &[EntityId]) -> Vec<EntityId> {
    let mut released = Vec::new();
    for id in ids {
        let Some(card) = doc.card(id) else {
            continue;
        };
        let Some(rail_id) = card.attached_rail.as_deref() else {
            continue;
        };
        let flush = doc.rail(rail_id).is_some_and(|rail| is_flush(card, rail));
        if !flush {
            if let Some(card) = doc.card_mut(id) {
                card.attached_rail = None;
            }
            debug!(card = %id, "card moved off its rail");
            released.push(id.clone());
        }
    }
    released
}
