//! Editor session: all state for one open map, and the input handlers.
//!
//! DESIGN
//! ======
//! `EditorSession` owns the camera, the document, the selection, the gesture
//! in progress, the handles the connector gave back, and the save state.
//! Nothing lives in globals. Handlers take host events and return `Action`s
//! for the host to act on; any change that moves something on screen calls
//! `Connector::repaint_all` before returning, so the drawn lines never lag
//! behind the data.
//!
//! Saving is two-phase so the host can do the I/O however it likes:
//! `begin_save` snapshots the JSON and the pending deletes it covers,
//! `complete_save` applies the store's answer. Only one save may be in
//! flight; a second `begin_save` is rejected.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::anchor::{directional_anchors, resolve_anchors};
use crate::bounds::{DocBounds, Size};
use crate::camera::{Camera, Point};
use crate::config::EditorConfig;
use crate::connections::{ConnectError, ConnectionRequest};
use crate::connector::{ConnectionHandle, Connector, StyleConfig, ensure_detached};
use crate::consts::{DEFAULT_RAIL_LENGTH, DETACH_ATTEMPTS, NEW_ENTITY_OFFSET_PX, WHEEL_NOTCH_PX};
use crate::doc::{Anchor, Card, CardContent, Connection, EntityId, MapDocument, Orientation, Rail};
use crate::hit::{Hit, HitPart, hit_test};
use crate::ids::{IdGenerator, UuidIds};
use crate::input::{Button, InputState, Key, Modifiers, PendingConnect, Tool, UiState, WheelDelta};
use crate::selection::{Align, Axis, Selection, align, distribute};
use crate::snap::{nearest_rail, reflush_all, reflush_attached, release_unflushed, resize_rail, settle_card};
use crate::store::{MapStore, StoreError};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    SelectionChanged(Vec<EntityId>),
    /// Rail to highlight as the drop target, or `None` to clear.
    SnapPreview(Option<EntityId>),
    /// A dragged card was dropped, attached to `rail` or to nothing.
    CardSettled { id: EntityId, rail: Option<EntityId> },
    ConnectSourcePicked(EntityId),
    ConnectionCreated(Connection),
    Deleted(Vec<EntityId>),
    /// User-facing message (toast).
    Notice(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("could not serialize map: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("save result does not match the save in progress")]
    StaleSave,
}

/// A save handed to the host by [`EditorSession::begin_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub map_id: String,
    pub json: String,
    /// Pending connection deletes this save persists.
    pub committing: BTreeSet<String>,
    token: u64,
}

pub struct EditorSession<C: Connector> {
    camera: Camera,
    viewport_origin: Point,
    doc: MapDocument,
    selection: Selection,
    config: EditorConfig,
    ui: UiState,
    input: InputState,
    connector: C,
    ids: Box<dyn IdGenerator>,
    /// Drawn connector handle per connection id.
    handles: HashMap<String, ConnectionHandle>,
    line_style: String,
    map_id: Option<String>,
    save_in_flight: Option<u64>,
    save_seq: u64,
}

impl<C: Connector> EditorSession<C> {
    #[must_use]
    pub fn new(connector: C, config: EditorConfig) -> Self {
        Self::with_ids(connector, config, Box::new(UuidIds))
    }

    #[must_use]
    pub fn with_ids(mut connector: C, config: EditorConfig, ids: Box<dyn IdGenerator>) -> Self {
        let camera = Camera::default();
        connector.set_zoom(camera.scale);
        Self {
            camera,
            viewport_origin: Point::new(0.0, 0.0),
            doc: MapDocument::new(),
            selection: Selection::new(),
            line_style: config.line_style.clone(),
            config,
            ui: UiState::default(),
            input: InputState::default(),
            connector,
            ids,
            handles: HashMap::new(),
            map_id: None,
            save_in_flight: None,
            save_seq: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn doc(&self) -> &MapDocument {
        &self.doc
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    #[must_use]
    pub fn line_style(&self) -> &str {
        &self.line_style
    }

    /// Map id of the last successful load or save.
    #[must_use]
    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.save_in_flight.is_some()
    }

    /// Connector handle currently drawing `connection_id`.
    #[must_use]
    pub fn handle_for(&self, connection_id: &str) -> Option<ConnectionHandle> {
        self.handles.get(connection_id).copied()
    }

    fn card_size(&self) -> Size {
        self.config.card_size()
    }

    fn world(&self, screen_pt: Point) -> Point {
        self.camera.screen_to_world(screen_pt, self.viewport_origin)
    }

    // --- View ---

    /// Screen position of the canvas viewport's top-left corner.
    pub fn set_viewport_origin(&mut self, origin: Point) {
        self.viewport_origin = origin;
    }

    /// Back to scale 1 with no pan.
    pub fn reset_view(&mut self) -> Vec<Action> {
        self.camera = Camera::default();
        self.connector.set_zoom(self.camera.scale);
        self.connector.repaint_all();
        vec![Action::RenderNeeded]
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.ui.tool != tool {
            self.ui.pending_connect = None;
        }
        self.ui.tool = tool;
    }

    /// Style key used for connections created from now on.
    pub fn set_line_style(&mut self, key: &str) {
        key.trim().clone_into(&mut self.line_style);
        if self.line_style.is_empty() {
            self.line_style.clone_from(&self.config.line_style);
        }
    }

    // --- Loading ---

    /// Load `map_id` from `store`. A missing map opens empty; a corrupt one
    /// opens empty with a warning.
    ///
    /// # Errors
    ///
    /// [`SessionError::Store`] when the store cannot be read; the session is
    /// left as it was.
    pub fn load_from(&mut self, store: &impl MapStore, map_id: &str) -> Result<(), SessionError> {
        let raw = store.load(map_id)?;
        let doc = raw.map_or_else(MapDocument::new, |json| MapDocument::from_json_lenient(&json));
        info!(%map_id, cards = doc.nodes.len(), rails = doc.rails.len(), connections = doc.connections.active_len(), "map loaded");
        self.map_id = Some(map_id.to_owned());
        self.replace_document(doc);
        Ok(())
    }

    /// Load a document the host fetched itself.
    pub fn load_json(&mut self, raw: &str) {
        self.replace_document(MapDocument::from_json_lenient(raw));
    }

    fn replace_document(&mut self, doc: MapDocument) {
        let orphans = doc.orphaned_connections().len();
        if orphans > 0 {
            warn!(orphans, "map has connections to missing items");
        }
        self.doc = doc;
        self.selection.clear();
        self.ui.pending_connect = None;
        self.ui.snap_preview = None;
        self.input = InputState::Idle;
        // A save started against the old document can no longer commit.
        self.save_in_flight = None;
        self.redraw_all();
    }

    /// Detach every drawn connection and draw the active ones again.
    ///
    /// Works from the registry as it is; never creates connections.
    pub fn redraw_all(&mut self) {
        for handle in std::mem::take(&mut self.handles).into_values() {
            ensure_detached(&mut self.connector, handle, DETACH_ATTEMPTS);
        }
        let active: Vec<Connection> = self.doc.connections.active().cloned().collect();
        for conn in &active {
            self.draw(conn);
        }
        self.connector.set_zoom(self.camera.scale);
        self.connector.repaint_all();
        debug!(connections = active.len(), "connections redrawn");
    }

    fn draw(&mut self, conn: &Connection) {
        let anchors = conn.anchors.unwrap_or([Anchor::CONTINUOUS; 2]);
        let style = StyleConfig::for_key(&conn.style, &self.config);
        match self.connector.connect(&conn.source, &conn.target, anchors, &style) {
            Some(handle) => {
                self.handles.insert(conn.id.clone(), handle);
            }
            None => warn!(connection = %conn.id, "connector could not draw connection"),
        }
    }

    fn detach(&mut self, connection_id: &str) {
        if let Some(handle) = self.handles.remove(connection_id) {
            ensure_detached(&mut self.connector, handle, DETACH_ATTEMPTS);
        }
    }

    // --- Saving ---

    /// Snapshot the document for saving.
    ///
    /// # Errors
    ///
    /// [`SessionError::SaveInFlight`] when another save has not completed,
    /// [`SessionError::Serialize`] if the document cannot be encoded.
    pub fn begin_save(&mut self, map_id: &str) -> Result<PendingSave, SessionError> {
        if self.save_in_flight.is_some() {
            warn!(%map_id, "save rejected: another save is in progress");
            return Err(SessionError::SaveInFlight);
        }
        let json = self.doc.to_json()?;
        let committing = self.doc.connections.pending_deletes().clone();
        self.save_seq += 1;
        self.save_in_flight = Some(self.save_seq);
        debug!(%map_id, bytes = json.len(), deletes = committing.len(), "save started");
        Ok(PendingSave { map_id: map_id.to_owned(), json, committing, token: self.save_seq })
    }

    /// Apply the store's answer to `pending`. On success the deletes it
    /// covered are committed and their count returned; on failure nothing
    /// changes and the user can retry.
    ///
    /// # Errors
    ///
    /// [`SessionError::Store`] carrying the store failure, or
    /// [`SessionError::StaleSave`] when `pending` is not the save in flight.
    pub fn complete_save(&mut self, pending: PendingSave, result: Result<(), StoreError>) -> Result<usize, SessionError> {
        if self.save_in_flight != Some(pending.token) {
            warn!(map_id = %pending.map_id, "ignoring result of a superseded save");
            return Err(SessionError::StaleSave);
        }
        self.save_in_flight = None;
        match result {
            Ok(()) => {
                let removed = self.doc.connections.commit_deletes(&pending.committing);
                for conn in &removed {
                    self.detach(&conn.id);
                }
                info!(map_id = %pending.map_id, committed = removed.len(), "map saved");
                self.map_id = Some(pending.map_id);
                Ok(removed.len())
            }
            Err(error) => {
                warn!(map_id = %pending.map_id, %error, "save failed; map unchanged");
                Err(error.into())
            }
        }
    }

    /// Run both save phases against `store`.
    ///
    /// # Errors
    ///
    /// As [`Self::begin_save`] and [`Self::complete_save`].
    pub fn save_to(&mut self, store: &mut impl MapStore, map_id: &str) -> Result<usize, SessionError> {
        let pending = self.begin_save(map_id)?;
        let result = store.save(&pending.map_id, &pending.json);
        self.complete_save(pending, result)
    }

    // --- Editing ---

    /// World point a new entity goes to when the host gives no position:
    /// a little inside the visible top-left corner.
    fn default_spawn_point(&self) -> Point {
        let screen = Point::new(
            self.viewport_origin.x + NEW_ENTITY_OFFSET_PX,
            self.viewport_origin.y + NEW_ENTITY_OFFSET_PX,
        );
        self.world(screen)
    }

    /// Add a card at `at` (world), or near the visible top-left. The new
    /// card becomes the selection.
    pub fn add_card(&mut self, at: Option<Point>) -> EntityId {
        let at = at.unwrap_or_else(|| self.default_spawn_point());
        let id = self.ids.next_id("card");
        self.doc.nodes.push(Card::new(id.clone(), at.x, at.y));
        self.selection.click(&id, false);
        self.connector.repaint_all();
        debug!(card = %id, x = at.x, y = at.y, "card added");
        id
    }

    pub fn add_rail(&mut self, orientation: Orientation, at: Option<Point>) -> EntityId {
        let at = at.unwrap_or_else(|| self.default_spawn_point());
        let id = self.ids.next_id("rail");
        self.doc.rails.push(Rail::new(id.clone(), orientation, at.x, at.y, DEFAULT_RAIL_LENGTH));
        self.connector.repaint_all();
        debug!(rail = %id, ?orientation, "rail added");
        id
    }

    /// Forget gesture and UI state that points at `id`.
    fn forget_entity(&mut self, id: &str) {
        self.selection.remove(id);
        if self.ui.pending_connect.as_ref().is_some_and(|p| p.source == id) {
            self.ui.pending_connect = None;
        }
        if self.ui.snap_preview.as_deref() == Some(id) {
            self.ui.snap_preview = None;
        }
        let busy = match &self.input {
            InputState::DraggingCard { id: g, .. }
            | InputState::DraggingRail { id: g, .. }
            | InputState::ResizingRail { id: g, .. } => g == id,
            InputState::Idle | InputState::Panning { .. } => false,
        };
        if busy {
            self.input = InputState::Idle;
        }
    }

    /// Delete a card and every connection touching it.
    pub fn delete_card(&mut self, id: &str) -> bool {
        let Some((_, removed)) = self.doc.delete_card(id) else {
            return false;
        };
        for conn in &removed {
            self.detach(&conn.id);
        }
        self.forget_entity(id);
        self.connector.repaint_all();
        info!(card = %id, connections = removed.len(), "card deleted");
        true
    }

    /// Delete a rail and its connections; cards on it are detached.
    pub fn delete_rail(&mut self, id: &str) -> bool {
        let Some(removal) = self.doc.delete_rail(id) else {
            return false;
        };
        for conn in &removal.connections {
            self.detach(&conn.id);
        }
        self.forget_entity(id);
        self.connector.repaint_all();
        info!(rail = %id, connections = removal.connections.len(), detached = removal.detached_cards.len(), "rail deleted");
        true
    }

    /// Delete every selected card. Returns the deleted ids.
    pub fn delete_selected(&mut self) -> Vec<EntityId> {
        let ids = self.selection.ids().to_vec();
        ids.into_iter().filter(|id| self.delete_card(id)).collect()
    }

    pub fn update_card_content(&mut self, id: &str, content: CardContent) -> bool {
        let Some(card) = self.doc.card_mut(id) else {
            return false;
        };
        card.content = content;
        true
    }

    pub fn set_card_style(&mut self, id: &str, style: &str) -> bool {
        let Some(card) = self.doc.card_mut(id) else {
            return false;
        };
        style.clone_into(&mut card.style);
        self.connector.repaint_all();
        true
    }

    /// Record the size the host measured for a card. Non-positive sizes are
    /// ignored.
    pub fn set_card_size(&mut self, id: &str, width: f64, height: f64) -> bool {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return false;
        }
        let Some(card) = self.doc.card_mut(id) else {
            return false;
        };
        card.width = Some(width);
        card.height = Some(height);
        self.connector.repaint_all();
        true
    }

    /// Soft-delete a connection: it stops being drawn and saved, and is
    /// removed for good by the next successful save.
    pub fn delete_connection(&mut self, id: &str) -> bool {
        if !self.doc.connections.mark_pending_delete(id) {
            return false;
        }
        self.detach(id);
        self.connector.repaint_all();
        debug!(connection = %id, "connection marked for deletion");
        true
    }

    /// Connect two entities with facing anchors.
    ///
    /// # Errors
    ///
    /// A [`ConnectError`] when an id is unknown, both ids are the same, or
    /// the pair is already connected and `allow_parallel` is false.
    pub fn connect(&mut self, source: &str, target: &str, allow_parallel: bool) -> Result<Connection, ConnectError> {
        let anchors = {
            let bounds = DocBounds::new(&self.doc, self.card_size());
            directional_anchors(&self.doc, &bounds, source, target).unwrap_or([Anchor::CONTINUOUS; 2])
        };
        self.create_connection(source, target, anchors, allow_parallel)
    }

    fn create_connection(
        &mut self,
        source: &str,
        target: &str,
        anchors: [Anchor; 2],
        allow_parallel: bool,
    ) -> Result<Connection, ConnectError> {
        for id in [source, target] {
            if !self.doc.contains(id) {
                return Err(ConnectError::UnknownEntity(id.to_owned()));
            }
        }
        let request = ConnectionRequest {
            source: source.to_owned(),
            target: target.to_owned(),
            style: self.line_style.clone(),
            anchors: Some(anchors),
            allow_parallel,
        };
        let conn = self.doc.connections.create(self.ids.as_mut(), request)?.clone();
        self.draw(&conn);
        self.connector.repaint_all();
        info!(connection = %conn.id, %source, %target, parallel = allow_parallel, "connection created");
        Ok(conn)
    }

    /// Replace the selection with the cards among `ids`; other ids are
    /// skipped.
    pub fn set_selection(&mut self, ids: &[EntityId]) -> Vec<Action> {
        self.selection.clear();
        for id in ids {
            if self.doc.card(id).is_some() && !self.selection.contains(id) {
                self.selection.click(id, true);
            }
        }
        vec![Action::SelectionChanged(self.selection.ids().to_vec())]
    }

    /// Put every attached card back flush against its rail. Returns how
    /// many cards were adjusted.
    pub fn resnap_all(&mut self) -> usize {
        let adjusted = reflush_all(&mut self.doc);
        self.connector.repaint_all();
        debug!(cards = adjusted, "attached cards re-flushed");
        adjusted
    }

    /// Align the selected cards. `false` when aligning is disabled or fewer
    /// than two cards are selected.
    pub fn align_selected(&mut self, mode: Align) -> bool {
        if !self.config.align_enabled {
            return false;
        }
        let ids = self.selection.ids().to_vec();
        let size = self.card_size();
        if !align(&mut self.doc, &ids, mode, size) {
            return false;
        }
        release_unflushed(&mut self.doc, &ids);
        self.connector.repaint_all();
        debug!(?mode, cards = ids.len(), "selection aligned");
        true
    }

    pub fn distribute_selected(&mut self, axis: Axis) -> bool {
        if !self.config.align_enabled {
            return false;
        }
        let ids = self.selection.ids().to_vec();
        let size = self.card_size();
        if !distribute(&mut self.doc, &ids, axis, size) {
            return false;
        }
        release_unflushed(&mut self.doc, &ids);
        self.connector.repaint_all();
        debug!(?axis, cards = ids.len(), "selection distributed");
        true
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        let world = self.world(screen_pt);
        match (button, self.ui.tool) {
            (Button::Middle, _) => {
                self.input = InputState::Panning { anchor: self.camera.pan_anchor(screen_pt) };
                Vec::new()
            }
            (Button::Secondary, _) => Vec::new(),
            (Button::Primary, Tool::Select) => self.select_press(screen_pt, world, modifiers),
            (Button::Primary, Tool::Connect) => self.connect_press(world, modifiers),
        }
    }

    fn select_press(&mut self, screen_pt: Point, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let drag = self.config.drag_enabled;
        match hit_test(world, &self.doc, self.card_size(), &self.camera) {
            None => {
                let actions = self.clear_selection();
                self.input = InputState::Panning { anchor: self.camera.pan_anchor(screen_pt) };
                actions
            }
            Some(Hit { id, part: HitPart::Card }) => {
                let toggle = modifiers.toggles_selection();
                self.selection.click(&id, toggle);
                if drag && !toggle {
                    if let Some(card) = self.doc.card(&id) {
                        self.input =
                            InputState::DraggingCard { id: id.clone(), start_world: world, orig_x: card.x, orig_y: card.y };
                    }
                }
                vec![Action::SelectionChanged(self.selection.ids().to_vec()), Action::RenderNeeded]
            }
            Some(Hit { id, part: HitPart::Rail }) if drag => {
                if let Some(rail) = self.doc.rail(&id) {
                    debug!(rail = %id, "rail drag started");
                    self.input = InputState::DraggingRail { start_world: world, orig_x: rail.x, orig_y: rail.y, id };
                }
                Vec::new()
            }
            Some(Hit { id, part: HitPart::RailHandle(end) }) if drag => {
                if let Some(rail) = self.doc.rail(&id) {
                    debug!(rail = %id, ?end, "rail resize started");
                    self.input = InputState::ResizingRail {
                        end,
                        start_world: world,
                        orig_start: rail.start(),
                        orig_length: rail.length(),
                        id,
                    };
                }
                Vec::new()
            }
            Some(_) => Vec::new(),
        }
    }

    fn connect_press(&mut self, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let Some(hit) = hit_test(world, &self.doc, self.card_size(), &self.camera) else {
            if self.ui.pending_connect.take().is_some() {
                debug!("connect cancelled on empty canvas");
            }
            let mut actions = self.clear_selection();
            actions.push(Action::RenderNeeded);
            return actions;
        };
        let Some(pending) = self.ui.pending_connect.take() else {
            debug!(source = %hit.id, "connect source picked");
            self.ui.pending_connect = Some(PendingConnect { source: hit.id.clone(), pointer: world });
            return vec![Action::ConnectSourcePicked(hit.id), Action::RenderNeeded];
        };
        if pending.source == hit.id {
            debug!(source = %hit.id, "connect source released");
            return vec![Action::RenderNeeded];
        }
        let anchors = {
            let bounds = DocBounds::new(&self.doc, self.card_size());
            resolve_anchors(&self.doc, &bounds, &pending.source, &hit.id, [Some(pending.pointer), Some(world)])
        };
        match self.create_connection(&pending.source, &hit.id, anchors, modifiers.forces_parallel()) {
            Ok(conn) => vec![Action::ConnectionCreated(conn), Action::RenderNeeded],
            Err(error) => {
                info!(%error, "connection declined");
                vec![Action::Notice(error.to_string())]
            }
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.world(screen_pt);
        let mut actions = Vec::new();
        match self.input.clone() {
            InputState::Idle => return actions,
            InputState::Panning { anchor } => {
                self.camera.pan_to(screen_pt, anchor);
            }
            InputState::DraggingCard { id, start_world, orig_x, orig_y } => {
                let size = self.card_size();
                let delta = world.minus(start_world);
                let Some(card) = self.doc.card_mut(&id) else {
                    self.input = InputState::Idle;
                    return actions;
                };
                card.x = orig_x + delta.x;
                card.y = orig_y + delta.y;
                let rect = card.rect(size);
                let preview = nearest_rail(&self.doc.rails, rect, self.config.snap_threshold).map(|c| c.rail_id);
                if preview != self.ui.snap_preview {
                    self.ui.snap_preview.clone_from(&preview);
                    actions.push(Action::SnapPreview(preview));
                }
            }
            InputState::DraggingRail { id, start_world, orig_x, orig_y } => {
                let delta = world.minus(start_world);
                if let Some(rail) = self.doc.rail_mut(&id) {
                    rail.x = orig_x + delta.x;
                    rail.y = orig_y + delta.y;
                }
                reflush_attached(&mut self.doc, &id);
            }
            InputState::ResizingRail { id, end, start_world, orig_start, orig_length } => {
                if let Some(rail) = self.doc.rail_mut(&id) {
                    let delta = match rail.orientation {
                        Orientation::Horizontal => world.x - start_world.x,
                        Orientation::Vertical => world.y - start_world.y,
                    };
                    resize_rail(rail, end, orig_start, orig_length, delta);
                }
                reflush_attached(&mut self.doc, &id);
            }
        }
        self.connector.repaint_all();
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        match std::mem::take(&mut self.input) {
            InputState::Idle => return actions,
            InputState::Panning { .. } => {}
            InputState::DraggingCard { id, orig_x, orig_y, .. } => {
                actions.extend(self.clear_snap_preview());
                let moved = self.doc.card(&id).is_some_and(|c| (c.x - orig_x).abs() > 0.0 || (c.y - orig_y).abs() > 0.0);
                if moved {
                    let rail = settle_card(&mut self.doc, &id, self.config.card_size(), self.config.snap_threshold);
                    actions.push(Action::CardSettled { id, rail });
                }
            }
            InputState::DraggingRail { id, .. } | InputState::ResizingRail { id, .. } => {
                debug!(rail = %id, "rail gesture finished");
            }
        }
        self.connector.repaint_all();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Pointer left the canvas or the host lost capture.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.cancel_gesture()
    }

    /// Abort the active gesture and any half-picked connection, putting
    /// moved entities back where they started.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let mut actions = self.clear_snap_preview();
        if self.ui.pending_connect.take().is_some() {
            debug!("pending connection dropped");
        }
        match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Panning { .. } => {}
            InputState::DraggingCard { id, orig_x, orig_y, .. } => {
                if let Some(card) = self.doc.card_mut(&id) {
                    card.x = orig_x;
                    card.y = orig_y;
                }
                debug!(card = %id, "card drag cancelled");
            }
            InputState::DraggingRail { id, orig_x, orig_y, .. } => {
                if let Some(rail) = self.doc.rail_mut(&id) {
                    rail.x = orig_x;
                    rail.y = orig_y;
                }
                reflush_attached(&mut self.doc, &id);
                debug!(rail = %id, "rail drag cancelled");
            }
            InputState::ResizingRail { id, orig_start, orig_length, .. } => {
                if let Some(rail) = self.doc.rail_mut(&id) {
                    rail.set_start(orig_start);
                    rail.set_length(orig_length);
                }
                reflush_attached(&mut self.doc, &id);
                debug!(rail = %id, "rail resize cancelled");
            }
        }
        self.connector.repaint_all();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Wheel zooms around the pointer; one [`WHEEL_NOTCH_PX`] of scroll is
    /// one zoom step, scrolling up zooms in.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        let notches = -delta.dy / WHEEL_NOTCH_PX;
        if !self.camera.zoom_at(screen_pt, self.viewport_origin, notches) {
            return Vec::new();
        }
        self.connector.set_zoom(self.camera.scale);
        self.connector.repaint_all();
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.is_escape() {
            return self.cancel_gesture();
        }
        if key.is_delete() && self.input.is_idle() {
            let deleted = self.delete_selected();
            if !deleted.is_empty() {
                return vec![Action::Deleted(deleted), Action::SelectionChanged(Vec::new()), Action::RenderNeeded];
            }
        }
        Vec::new()
    }

    fn clear_selection(&mut self) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        self.selection.clear();
        vec![Action::SelectionChanged(Vec::new())]
    }

    fn clear_snap_preview(&mut self) -> Vec<Action> {
        if self.ui.snap_preview.take().is_some() { vec![Action::SnapPreview(None)] } else { Vec::new() }
    }
}
