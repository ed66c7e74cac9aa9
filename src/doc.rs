//! Document model: cards, rails, connections, anchors, and the map aggregate.
//!
//! `MapDocument` is the single load/save unit. It serializes to the stored
//! JSON shape (`nodes`, `rails`, `connections`) and is loaded leniently: the
//! stored document may come from older editor builds or form posts, so
//! missing arrays default to empty, numeric fields may arrive as strings, and
//! anything unreadable yields an empty document rather than an error.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::de::{self, Deserializer};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bounds::{Rect, Size};
use crate::connections::ConnectionRegistry;
use crate::consts::{DEFAULT_RAIL_LENGTH, MIN_RAIL_LENGTH, RAIL_THICKNESS};

/// Id of a card or rail. Connections refer to either kind by this id.
pub type EntityId = String;

/// Opaque display fields carried by a card. The engine only preserves them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardContent {
    /// Title text.
    pub text: String,
    /// Caption shown under the title.
    pub caption: String,
    /// Image URL.
    pub image: String,
    /// Link URL.
    pub link: String,
    /// Link target (`_self`, `_blank`, ...).
    pub target: String,
}

/// A draggable content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: EntityId,
    /// Left edge in world coordinates.
    #[serde(deserialize_with = "lenient_f64")]
    pub x: f64,
    /// Top edge in world coordinates.
    #[serde(deserialize_with = "lenient_f64")]
    pub y: f64,
    /// Stored width; the configured default applies when absent.
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Stored height; the configured default applies when absent.
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub content: CardContent,
    /// Visual style tag.
    #[serde(default)]
    pub style: String,
    /// Rail this card is snapped to, if any.
    #[serde(default, rename = "attachedRail", skip_serializing_if = "Option::is_none")]
    pub attached_rail: Option<EntityId>,
}

impl Card {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width: None,
            height: None,
            content: CardContent::default(),
            style: String::new(),
            attached_rail: None,
        }
    }

    /// Stored size, falling back to `default` per axis.
    #[must_use]
    pub fn size(&self, default: Size) -> Size {
        Size {
            width: self.width.unwrap_or(default.width),
            height: self.height.unwrap_or(default.height),
        }
    }

    /// World-space bounding box using the stored size or `default`.
    #[must_use]
    pub fn rect(&self, default: Size) -> Rect {
        let size = self.size(default);
        Rect::new(self.x, self.y, size.width, size.height)
    }
}

/// Rail direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A linear guide that cards snap onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rail {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_f64")]
    pub x: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub y: f64,
    pub orientation: Orientation,
    /// Length of a horizontal rail.
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Length of a vertical rail.
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Rail {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, orientation: Orientation, x: f64, y: f64, length: f64) -> Self {
        let mut rail = Self { id: id.into(), x, y, orientation, width: None, height: None };
        rail.set_length(length);
        rail
    }

    /// Extent along the long axis.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.width.unwrap_or(DEFAULT_RAIL_LENGTH),
            Orientation::Vertical => self.height.unwrap_or(DEFAULT_RAIL_LENGTH),
        }
    }

    pub fn set_length(&mut self, length: f64) {
        match self.orientation {
            Orientation::Horizontal => self.width = Some(length),
            Orientation::Vertical => self.height = Some(length),
        }
    }

    /// Position along the long axis where the rail starts.
    #[must_use]
    pub fn start(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    pub fn set_start(&mut self, start: f64) {
        match self.orientation {
            Orientation::Horizontal => self.x = start,
            Orientation::Vertical => self.y = start,
        }
    }

    /// Position of the rail on the cross axis (`y` for horizontal rails).
    #[must_use]
    pub fn cross_position(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.y,
            Orientation::Vertical => self.x,
        }
    }

    /// Cross-axis coordinate of the rail's center line.
    #[must_use]
    pub fn center_line(&self) -> f64 {
        self.cross_position() + RAIL_THICKNESS / 2.0
    }

    /// Whether `coord` on the long axis falls within the rail's span.
    #[must_use]
    pub fn spans(&self, coord: f64) -> bool {
        coord >= self.start() && coord <= self.start() + self.length()
    }

    /// World-space bounding box; the cross axis is [`RAIL_THICKNESS`].
    #[must_use]
    pub fn rect(&self) -> Rect {
        match self.orientation {
            Orientation::Horizontal => Rect::new(self.x, self.y, self.length(), RAIL_THICKNESS),
            Orientation::Vertical => Rect::new(self.x, self.y, RAIL_THICKNESS, self.length()),
        }
    }
}

/// Named attachment point. `Continuous` lets the connector pick the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedAnchor {
    Top,
    Bottom,
    Left,
    Right,
    Continuous,
}

/// Exact attachment point: `x`/`y` in `[0,1]` across the bounding box,
/// `dx`/`dy` in `{-1,0,1}` naming the face the point lies on.
///
/// Stored as a four-element array `[x, y, dx, dy]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PreciseAnchor {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl From<[f64; 4]> for PreciseAnchor {
    fn from([x, y, dx, dy]: [f64; 4]) -> Self {
        Self { x, y, dx, dy }
    }
}

impl From<PreciseAnchor> for [f64; 4] {
    fn from(a: PreciseAnchor) -> Self {
        [a.x, a.y, a.dx, a.dy]
    }
}

/// Where one end of a connection attaches to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    Named(NamedAnchor),
    Precise(PreciseAnchor),
}

impl Anchor {
    pub const TOP: Anchor = Anchor::Named(NamedAnchor::Top);
    pub const BOTTOM: Anchor = Anchor::Named(NamedAnchor::Bottom);
    pub const LEFT: Anchor = Anchor::Named(NamedAnchor::Left);
    pub const RIGHT: Anchor = Anchor::Named(NamedAnchor::Right);
    pub const CONTINUOUS: Anchor = Anchor::Named(NamedAnchor::Continuous);

    #[must_use]
    pub fn precise(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Anchor::Precise(PreciseAnchor { x, y, dx, dy })
    }
}

/// A line between two entities. The pair is unordered for uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: EntityId,
    pub target: EntityId,
    /// Line-style key.
    #[serde(default)]
    pub style: String,
    /// Source and target anchors captured at creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors: Option<[Anchor; 2]>,
}

impl Connection {
    /// Whether this connection joins `a` and `b` in either direction.
    #[must_use]
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Whether either end is `id`.
    #[must_use]
    pub fn references(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Borrowed view of either entity kind.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Card(&'a Card),
    Rail(&'a Rail),
}

impl Entity<'_> {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Entity::Card(card) => &card.id,
            Entity::Rail(rail) => &rail.id,
        }
    }

    #[must_use]
    pub fn as_rail(&self) -> Option<&Rail> {
        match self {
            Entity::Rail(rail) => Some(rail),
            Entity::Card(_) => None,
        }
    }
}

/// Everything removed by a rail delete.
#[derive(Debug, Clone)]
pub struct RailRemoval {
    pub rail: Rail,
    pub connections: Vec<Connection>,
    /// Cards whose `attached_rail` was cleared.
    pub detached_cards: Vec<EntityId>,
}

/// All cards, rails and connections of one map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapDocument {
    #[serde(default)]
    pub nodes: Vec<Card>,
    #[serde(default)]
    pub rails: Vec<Rail>,
    #[serde(default)]
    pub connections: ConnectionRegistry,
}

impl MapDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored document, falling back to an empty one when the input
    /// is not usable. Null or missing arrays are treated as empty.
    #[must_use]
    pub fn from_json_lenient(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        let mut value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "stored map is not valid JSON; starting empty");
                return Self::default();
            }
        };
        if value.is_null() {
            return Self::default();
        }
        let Some(fields) = value.as_object_mut() else {
            warn!("stored map is not a JSON object; starting empty");
            return Self::default();
        };
        fields.retain(|_, v| !v.is_null());
        if fields.get("nodes").is_some_and(|nodes| !nodes.is_array()) {
            warn!("stored map has non-array nodes; starting empty");
            return Self::default();
        }
        match serde_json::from_value::<Self>(value) {
            Ok(mut doc) => {
                doc.sanitize_sizes();
                doc
            }
            Err(error) => {
                warn!(%error, "stored map is malformed; starting empty");
                Self::default()
            }
        }
    }

    /// Stored sizes the editor cannot work with are repaired: rails shorter
    /// than [`MIN_RAIL_LENGTH`] are lengthened to it, and non-positive card
    /// sizes are dropped so the configured default applies.
    fn sanitize_sizes(&mut self) {
        for rail in &mut self.rails {
            if rail.length() < MIN_RAIL_LENGTH {
                warn!(rail = %rail.id, length = rail.length(), "stored rail too short; using minimum length");
                rail.set_length(MIN_RAIL_LENGTH);
            }
        }
        for card in &mut self.nodes {
            if card.width.is_some_and(|w| w <= 0.0) || card.height.is_some_and(|h| h <= 0.0) {
                warn!(card = %card.id, "stored card size is not positive; using default size");
                card.width = None;
                card.height = None;
            }
        }
    }

    /// Serialize for storage. Pending-delete connections are excluded.
    ///
    /// # Errors
    ///
    /// Returns an error when any coordinate, size or anchor value is not
    /// finite. JSON would store those as `null`, which no longer loads.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        if let Some(id) = self.first_non_finite() {
            return Err(serde_json::Error::custom(format!("non-finite value in {id}")));
        }
        serde_json::to_string(self)
    }

    /// Id of the first entity or connection carrying a NaN or infinite value.
    fn first_non_finite(&self) -> Option<&str> {
        fn finite(values: &[f64]) -> bool {
            values.iter().all(|v| v.is_finite())
        }
        fn opt(v: Option<f64>) -> f64 {
            v.unwrap_or(0.0)
        }
        let card = self
            .nodes
            .iter()
            .find(|c| !finite(&[c.x, c.y, opt(c.width), opt(c.height)]))
            .map(|c| c.id.as_str());
        let rail = || {
            self.rails
                .iter()
                .find(|r| !finite(&[r.x, r.y, opt(r.width), opt(r.height)]))
                .map(|r| r.id.as_str())
        };
        let connection = || {
            self.connections
                .active()
                .find(|c| {
                    c.anchors.is_some_and(|anchors| {
                        anchors.iter().any(|a| match a {
                            Anchor::Precise(p) => !finite(&[p.x, p.y, p.dx, p.dy]),
                            Anchor::Named(_) => false,
                        })
                    })
                })
                .map(|c| c.id.as_str())
        };
        card.or_else(rail).or_else(connection)
    }

    #[must_use]
    pub fn card(&self, id: &str) -> Option<&Card> {
        self.nodes.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: &str) -> Option<&mut Card> {
        self.nodes.iter_mut().find(|c| c.id == id)
    }

    #[must_use]
    pub fn rail(&self, id: &str) -> Option<&Rail> {
        self.rails.iter().find(|r| r.id == id)
    }

    pub fn rail_mut(&mut self, id: &str) -> Option<&mut Rail> {
        self.rails.iter_mut().find(|r| r.id == id)
    }

    /// Look up a card or rail by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<Entity<'_>> {
        self.card(id)
            .map(Entity::Card)
            .or_else(|| self.rail(id).map(Entity::Rail))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entity(id).is_some()
    }

    /// Remove a card and every connection that references it.
    pub fn delete_card(&mut self, id: &str) -> Option<(Card, Vec<Connection>)> {
        let index = self.nodes.iter().position(|c| c.id == id)?;
        let card = self.nodes.remove(index);
        let removed = self.connections.remove_for_entity(id);
        Some((card, removed))
    }

    /// Remove a rail, its connections, and detach every card snapped to it.
    pub fn delete_rail(&mut self, id: &str) -> Option<RailRemoval> {
        let index = self.rails.iter().position(|r| r.id == id)?;
        let rail = self.rails.remove(index);
        let connections = self.connections.remove_for_entity(id);
        let mut detached_cards = Vec::new();
        for card in &mut self.nodes {
            if card.attached_rail.as_deref() == Some(id) {
                card.attached_rail = None;
                detached_cards.push(card.id.clone());
            }
        }
        Some(RailRemoval { rail, connections, detached_cards })
    }

    /// Connections whose source or target no longer exists.
    #[must_use]
    pub fn orphaned_connections(&self) -> Vec<&Connection> {
        self.connections
            .active()
            .filter(|c| !self.contains(&c.source) || !self.contains(&c.target))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn parse_number<E: de::Error>(raw: NumberOrText) -> Result<Option<f64>, E> {
    let value = match raw {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>().map_err(E::custom)?
        }
    };
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(E::custom("non-finite coordinate"))
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    parse_number(NumberOrText::deserialize(deserializer)?)?.ok_or_else(|| de::Error::custom("empty coordinate"))
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(raw) => parse_number(raw),
        None => Ok(None),
    }
}
