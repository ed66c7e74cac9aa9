//! Card selection and the layout operations that act on it.
//!
//! Layout operations need at least two selected cards and do nothing
//! otherwise. Sizes come from the stored card size or the configured
//! default, the same source the anchors and snapping use.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::bounds::{Rect, Size};
use crate::doc::{EntityId, MapDocument};

/// Ordered set of selected card ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<EntityId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a click on `id`. Without `toggle` the selection becomes just
    /// `id`; with it, `id` is added or removed and the rest is kept.
    pub fn click(&mut self, id: &str, toggle: bool) {
        if toggle {
            if let Some(pos) = self.ids.iter().position(|s| s == id) {
                self.ids.remove(pos);
            } else {
                self.ids.push(id.to_owned());
            }
        } else {
            self.ids.clear();
            self.ids.push(id.to_owned());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|s| s != id);
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

fn selected_rects(doc: &MapDocument, ids: &[EntityId], default_size: Size) -> Vec<(EntityId, Rect)> {
    ids.iter()
        .filter_map(|id| doc.card(id).map(|card| (card.id.clone(), card.rect(default_size))))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Align the selected cards. Returns `false` when fewer than two of `ids`
/// are cards.
pub fn align(doc: &mut MapDocument, ids: &[EntityId], mode: Align, default_size: Size) -> bool {
    let rects = selected_rects(doc, ids, default_size);
    if rects.len() < 2 {
        return false;
    }
    let target = match mode {
        Align::Left => rects.iter().map(|(_, r)| r.x).fold(f64::INFINITY, f64::min),
        Align::Right => rects.iter().map(|(_, r)| r.right()).fold(f64::NEG_INFINITY, f64::max),
        Align::Center => mean(rects.iter().map(|(_, r)| r.center().x)),
        Align::Top => rects.iter().map(|(_, r)| r.y).fold(f64::INFINITY, f64::min),
        Align::Bottom => rects.iter().map(|(_, r)| r.bottom()).fold(f64::NEG_INFINITY, f64::max),
        Align::Middle => mean(rects.iter().map(|(_, r)| r.center().y)),
    };
    for (id, rect) in &rects {
        let Some(card) = doc.card_mut(id) else {
            continue;
        };
        match mode {
            Align::Left => card.x = target,
            Align::Right => card.x = target - rect.width,
            Align::Center => card.x = target - rect.width / 2.0,
            Align::Top => card.y = target,
            Align::Bottom => card.y = target - rect.height,
            Align::Middle => card.y = target - rect.height / 2.0,
        }
    }
    true
}

/// Space the selected cards evenly along `axis`.
///
/// Cards are ordered by position; the first and last stay put and the
/// ones between are placed so every gap is
/// `(span - sum of sizes) / (n - 1)`, where the span runs from the first
/// card's leading edge to the last card's trailing edge. Returns `false` when fewer than two
/// of `ids` are cards.
#[allow(clippy::cast_precision_loss)]
pub fn distribute(doc: &mut MapDocument, ids: &[EntityId], axis: Axis, default_size: Size) -> bool {
    let mut items: Vec<(EntityId, f64, f64)> = selected_rects(doc, ids, default_size)
        .into_iter()
        .map(|(id, r)| match axis {
            Axis::Horizontal => (id, r.x, r.width),
            Axis::Vertical => (id, r.y, r.height),
        })
        .collect();
    if items.len() < 2 {
        return false;
    }
    items.sort_by(|a, b| a.1.total_cmp(&b.1));

    let last = items.len() - 1;
    let leading = items[0].1;
    let trailing = items[last].1 + items[last].2;
    let occupied: f64 = items.iter().map(|(_, _, size)| size).sum();
    let gap = ((trailing - leading) - occupied) / last as f64;

    let mut cursor = items[0].1 + items[0].2 + gap;
    for (id, _, size) in &items[1..last] {
        if let Some(card) = doc.card_mut(id) {
            match axis {
                Axis::Horizontal => card.x = cursor,
                Axis::Vertical => card.y = cursor,
            }
        }
        cursor += size + gap;
    }
    true
}
