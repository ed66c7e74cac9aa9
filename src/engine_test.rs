#![allow(clippy::float_cmp)]

use super::*;
use crate::ids::SequentialIds;
use crate::store::MemoryStore;

// =============================================================
// Helpers
// =============================================================

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Connector fake that records every call.
#[derive(Debug, Default)]
struct RecordingConnector {
    next: u64,
    connects: Vec<(String, String, [Anchor; 2], StyleConfig)>,
    removed: Vec<ConnectionHandle>,
    remove_calls: usize,
    /// Number of `remove` calls that fail before removes start working.
    fail_removes: usize,
    repaints: usize,
    zooms: Vec<f64>,
}

impl Connector for RecordingConnector {
    fn connect(&mut self, source: &str, target: &str, anchors: [Anchor; 2], style: &StyleConfig) -> Option<ConnectionHandle> {
        self.next += 1;
        self.connects.push((source.to_owned(), target.to_owned(), anchors, style.clone()));
        Some(ConnectionHandle(self.next))
    }

    fn remove(&mut self, handle: ConnectionHandle) -> bool {
        self.remove_calls += 1;
        if self.fail_removes > 0 {
            self.fail_removes -= 1;
            return false;
        }
        self.removed.push(handle);
        true
    }

    fn repaint_all(&mut self) {
        self.repaints += 1;
    }

    fn set_zoom(&mut self, scale: f64) {
        self.zooms.push(scale);
    }
}

struct BrokenStore;

impl MapStore for BrokenStore {
    fn load(&self, _: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("offline".into()))
    }

    fn save(&mut self, _: &str, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("offline".into()))
    }
}

type Session = EditorSession<RecordingConnector>;

fn session_with(connector: RecordingConnector, config: EditorConfig) -> Session {
    EditorSession::with_ids(connector, config, Box::new(SequentialIds::new()))
}

fn session() -> Session {
    session_with(RecordingConnector::default(), EditorConfig::default())
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Default::default() }
}

fn alt() -> Modifiers {
    Modifiers { alt: true, ..Default::default() }
}

fn escape() -> Key {
    Key("Escape".into())
}

fn click(s: &mut Session, x: f64, y: f64, modifiers: Modifiers) -> Vec<Action> {
    let mut actions = s.on_pointer_down(pt(x, y), Button::Primary, modifiers);
    actions.extend(s.on_pointer_up(pt(x, y), Button::Primary, modifiers));
    actions
}

fn drag(s: &mut Session, from: Point, to: Point) -> Vec<Action> {
    let mut actions = s.on_pointer_down(from, Button::Primary, no_modifiers());
    actions.extend(s.on_pointer_move(to, no_modifiers()));
    actions.extend(s.on_pointer_up(to, Button::Primary, no_modifiers()));
    actions
}

fn card_pos(s: &Session, id: &str) -> (f64, f64) {
    s.doc().card(id).map_or((f64::NAN, f64::NAN), |c| (c.x, c.y))
}

// =============================================================
// Construction and entities
// =============================================================

#[test]
fn new_session_is_empty_and_idle() {
    let s = session();
    assert!(s.doc().nodes.is_empty());
    assert!(s.input().is_idle());
    assert_eq!(s.ui().tool, Tool::Select);
    assert_eq!(s.line_style(), "solid");
    assert_eq!(s.connector().zooms, vec![1.0]);
}

#[test]
fn add_card_uses_injected_ids_and_selects_it() {
    let mut s = session();
    let a = s.add_card(Some(pt(10.0, 20.0)));
    let b = s.add_card(Some(pt(300.0, 20.0)));
    assert_eq!(a, "card-1");
    assert_eq!(b, "card-2");
    assert_eq!(card_pos(&s, &a), (10.0, 20.0));
    assert_eq!(s.selection().ids(), &[b][..]);
}

#[test]
fn add_card_without_position_lands_inside_the_view() {
    let mut s = session();
    let a = s.add_card(None);
    assert_eq!(card_pos(&s, &a), (40.0, 40.0));
}

#[test]
fn add_rail_has_default_length() {
    let mut s = session();
    let r = s.add_rail(Orientation::Vertical, Some(pt(5.0, 6.0)));
    assert_eq!(r, "rail-1");
    let rail = s.doc().rail(&r).unwrap();
    assert_eq!(rail.length(), DEFAULT_RAIL_LENGTH);
    assert_eq!(rail.orientation, Orientation::Vertical);
}

#[test]
fn geometry_changes_repaint() {
    let mut s = session();
    let before = s.connector().repaints;
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let after_add = s.connector().repaints;
    assert!(after_add > before);
    assert!(s.set_card_size(&a, 100.0, 80.0));
    assert!(s.connector().repaints > after_add);
}

#[test]
fn set_card_size_rejects_bad_sizes() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    assert!(!s.set_card_size(&a, 0.0, 10.0));
    assert!(!s.set_card_size(&a, 10.0, f64::NAN));
    assert!(!s.set_card_size("ghost", 10.0, 10.0));
    assert!(s.doc().card(&a).unwrap().width.is_none());
}

#[test]
fn card_content_and_style_updates() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let content = CardContent { text: "Title".into(), link: "https://example.com".into(), ..Default::default() };
    assert!(s.update_card_content(&a, content.clone()));
    assert!(s.set_card_style(&a, "highlight"));
    let card = s.doc().card(&a).unwrap();
    assert_eq!(card.content, content);
    assert_eq!(card.style, "highlight");
    assert!(!s.set_card_style("ghost", "x"));
}

// =============================================================
// Camera: wheel zoom and pan
// =============================================================

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let mut s = session();
    s.set_viewport_origin(pt(20.0, 30.0));
    let screen = pt(120.0, 130.0);
    let before = s.camera().screen_to_world(screen, pt(20.0, 30.0));
    let actions = s.on_wheel(screen, WheelDelta { dx: 0.0, dy: -100.0 }, no_modifiers());
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(approx_eq(s.camera().scale, 1.1));
    let after = s.camera().screen_to_world(screen, pt(20.0, 30.0));
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
    assert!(approx_eq(*s.connector().zooms.last().unwrap(), 1.1));
}

#[test]
fn wheel_at_limit_does_nothing() {
    let mut s = session();
    assert!(!s.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 100_000.0 }, no_modifiers()).is_empty());
    assert!(approx_eq(s.camera().scale, 0.2));
    let repaints = s.connector().repaints;
    assert!(s.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 500.0 }, no_modifiers()).is_empty());
    assert_eq!(s.connector().repaints, repaints);
}

#[test]
fn drag_on_empty_canvas_pans() {
    let mut s = session();
    s.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers());
    s.on_pointer_move(pt(60.0, 30.0), no_modifiers());
    s.on_pointer_up(pt(60.0, 30.0), Button::Primary, no_modifiers());
    assert_eq!(s.camera().pan_x, 50.0);
    assert_eq!(s.camera().pan_y, 20.0);
    assert!(s.input().is_idle());
}

#[test]
fn middle_button_pans_even_over_cards() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    s.on_pointer_down(pt(10.0, 10.0), Button::Middle, no_modifiers());
    s.on_pointer_move(pt(30.0, 10.0), no_modifiers());
    assert_eq!(s.camera().pan_x, 20.0);
    assert_eq!(card_pos(&s, &a), (0.0, 0.0));
}

#[test]
fn reset_view_restores_identity() {
    let mut s = session();
    s.on_wheel(pt(50.0, 50.0), WheelDelta { dx: 0.0, dy: -300.0 }, no_modifiers());
    s.reset_view();
    assert_eq!(s.camera().scale, 1.0);
    assert_eq!(s.camera().pan_x, 0.0);
    assert_eq!(*s.connector().zooms.last().unwrap(), 1.0);
}

// =============================================================
// Selection gestures
// =============================================================

#[test]
fn click_selects_and_shift_click_toggles() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(400.0, 0.0)));
    click(&mut s, 10.0, 10.0, no_modifiers());
    assert_eq!(s.selection().ids(), &[a.clone()][..]);
    click(&mut s, 410.0, 10.0, shift());
    assert_eq!(s.selection().ids(), &[a.clone(), b][..]);
    click(&mut s, 10.0, 10.0, shift());
    assert!(!s.selection().contains(&a));
}

#[test]
fn click_on_empty_canvas_clears_selection() {
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    let actions = click(&mut s, 1000.0, 1000.0, no_modifiers());
    assert!(s.selection().is_empty());
    assert!(actions.contains(&Action::SelectionChanged(Vec::new())));
}

#[test]
fn delete_key_removes_selected_cards() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(400.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    let handle = s.handle_for(&conn.id).unwrap();
    click(&mut s, 10.0, 10.0, no_modifiers());
    let actions = s.on_key_down(&Key("Delete".into()), no_modifiers());
    assert_eq!(actions[0], Action::Deleted(vec![a.clone()]));
    assert!(s.doc().card(&a).is_none());
    assert!(s.doc().card(&b).is_some());
    assert_eq!(s.doc().connections.active_len(), 0);
    assert!(s.connector().removed.contains(&handle));
    assert!(s.handle_for(&conn.id).is_none());
}

// =============================================================
// Card drag and rail snapping
// =============================================================

#[test]
fn dragging_a_card_moves_it_by_the_pointer_delta() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let actions = drag(&mut s, pt(10.0, 10.0), pt(110.0, 60.0));
    assert_eq!(card_pos(&s, &a), (100.0, 50.0));
    assert!(actions.contains(&Action::CardSettled { id: a, rail: None }));
    assert!(s.input().is_idle());
}

#[test]
fn drag_is_measured_in_world_units_when_zoomed() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    s.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 100_000.0 }, no_modifiers());
    // scale 0.2, pan 0: screen (10, 10) is world (50, 50)
    drag(&mut s, pt(10.0, 10.0), pt(30.0, 10.0));
    assert!(approx_eq(card_pos(&s, &a).0, 100.0));
}

#[test]
fn dropping_near_a_rail_snaps_and_previews() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    s.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers());
    let moved = s.on_pointer_move(pt(10.0, 290.0), no_modifiers());
    assert!(moved.contains(&Action::SnapPreview(Some(r.clone()))));
    assert_eq!(s.ui().snap_preview.as_deref(), Some(r.as_str()));
    let dropped = s.on_pointer_up(pt(10.0, 290.0), Button::Primary, no_modifiers());
    assert!(dropped.contains(&Action::SnapPreview(None)));
    assert!(dropped.contains(&Action::CardSettled { id: a.clone(), rail: Some(r.clone()) }));
    assert_eq!(card_pos(&s, &a).1, 312.0);
    assert_eq!(s.doc().card(&a).unwrap().attached_rail.as_deref(), Some(r.as_str()));
}

#[test]
fn sliding_along_a_rail_keeps_the_snap() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    drag(&mut s, pt(10.0, 10.0), pt(10.0, 290.0));
    drag(&mut s, pt(10.0, 320.0), pt(60.0, 320.0));
    assert_eq!(card_pos(&s, &a), (50.0, 312.0));
    assert_eq!(s.doc().card(&a).unwrap().attached_rail.as_deref(), Some(r.as_str()));
}

#[test]
fn escape_puts_a_dragged_card_back() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    s.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers());
    s.on_pointer_move(pt(10.0, 290.0), no_modifiers());
    let actions = s.on_key_down(&escape(), no_modifiers());
    assert!(actions.contains(&Action::SnapPreview(None)));
    assert_eq!(card_pos(&s, &a), (0.0, 0.0));
    assert!(s.input().is_idle());
    assert!(s.doc().card(&a).unwrap().attached_rail.is_none());
}

#[test]
fn drag_disabled_only_selects() {
    let config = EditorConfig { drag_enabled: false, ..Default::default() };
    let mut s = session_with(RecordingConnector::default(), config);
    let a = s.add_card(Some(pt(0.0, 0.0)));
    s.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers());
    assert!(s.on_pointer_move(pt(100.0, 100.0), no_modifiers()).is_empty());
    assert_eq!(card_pos(&s, &a), (0.0, 0.0));
    assert!(s.selection().contains(&a));
}

// =============================================================
// Rail gestures
// =============================================================

#[test]
fn moving_a_rail_carries_attached_cards() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    drag(&mut s, pt(10.0, 10.0), pt(10.0, 290.0));
    s.on_pointer_down(pt(200.0, 305.0), Button::Primary, no_modifiers());
    assert!(matches!(s.input(), InputState::DraggingRail { .. }));
    s.on_pointer_move(pt(200.0, 355.0), no_modifiers());
    assert_eq!(s.doc().rail(&r).unwrap().y, 350.0);
    assert_eq!(card_pos(&s, &a).1, 362.0);
    s.on_pointer_up(pt(200.0, 355.0), Button::Primary, no_modifiers());
    assert!(s.input().is_idle());
}

#[test]
fn resizing_a_rail_clamps_and_escape_restores() {
    let mut s = session();
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    s.on_pointer_down(pt(400.0, 305.0), Button::Primary, no_modifiers());
    assert!(matches!(s.input(), InputState::ResizingRail { .. }));
    s.on_pointer_move(pt(500.0, 305.0), no_modifiers());
    assert_eq!(s.doc().rail(&r).unwrap().length(), 500.0);
    s.on_pointer_move(pt(0.0, 305.0), no_modifiers());
    assert_eq!(s.doc().rail(&r).unwrap().length(), 60.0);
    s.on_key_down(&escape(), no_modifiers());
    let rail = s.doc().rail(&r).unwrap();
    assert_eq!((rail.x, rail.length()), (0.0, 400.0));
    assert!(s.input().is_idle());
}

#[test]
fn pointer_cancel_restores_moved_rail_and_its_cards() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    drag(&mut s, pt(10.0, 10.0), pt(10.0, 290.0));
    s.on_pointer_down(pt(200.0, 305.0), Button::Primary, no_modifiers());
    s.on_pointer_move(pt(200.0, 500.0), no_modifiers());
    s.on_pointer_cancel();
    assert_eq!(s.doc().rail(&r).unwrap().y, 300.0);
    assert_eq!(card_pos(&s, &a).1, 312.0);
}

#[test]
fn deleting_a_rail_detaches_cards_and_connections() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    drag(&mut s, pt(10.0, 10.0), pt(10.0, 290.0));
    s.connect(&a, &r, false).unwrap();
    assert!(s.delete_rail(&r));
    assert!(s.doc().rail(&r).is_none());
    assert!(s.doc().card(&a).unwrap().attached_rail.is_none());
    assert_eq!(s.doc().connections.active_len(), 0);
    assert_eq!(s.connector().removed.len(), 1);
    assert!(!s.delete_rail(&r));
}

// =============================================================
// Connections
// =============================================================

#[test]
fn connect_uses_facing_edges() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    assert_eq!(conn.anchors, Some([Anchor::RIGHT, Anchor::LEFT]));
    assert_eq!(conn.style, "solid");
    let (source, target, anchors, style) = &s.connector().connects[0];
    assert_eq!((source.as_str(), target.as_str()), (a.as_str(), b.as_str()));
    assert_eq!(*anchors, [Anchor::RIGHT, Anchor::LEFT]);
    assert_eq!(style.key, "solid");
    assert_eq!(style.color, "#555555");
}

#[test]
fn duplicate_connect_is_declined_unless_parallel() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    s.connect(&a, &b, false).unwrap();
    let err = s.connect(&b, &a, false).unwrap_err();
    assert!(matches!(err, ConnectError::Duplicate { .. }));
    assert_eq!(s.doc().connections.active_len(), 1);
    s.connect(&b, &a, true).unwrap();
    assert_eq!(s.doc().connections.active_len(), 2);
}

#[test]
fn connect_unknown_entity_fails() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    assert_eq!(s.connect(&a, "ghost", false), Err(ConnectError::UnknownEntity("ghost".into())));
    assert!(s.connector().connects.is_empty());
}

#[test]
fn line_style_applies_to_new_connections() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    s.set_line_style("dashed");
    let conn = s.connect(&a, &b, false).unwrap();
    assert_eq!(conn.style, "dashed");
    assert_eq!(s.connector().connects[0].3.key, "dashed");
    s.set_line_style("   ");
    assert_eq!(s.line_style(), "solid");
}

#[test]
fn connect_tool_two_clicks_create_with_pointer_anchors() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(400.0, 0.0)));
    s.set_tool(Tool::Connect);
    let first = click(&mut s, 230.0, 80.0, no_modifiers());
    assert_eq!(first[0], Action::ConnectSourcePicked(a.clone()));
    assert!(s.ui().pending_connect.is_some());
    let second = click(&mut s, 410.0, 80.0, no_modifiers());
    let Action::ConnectionCreated(conn) = &second[0] else {
        panic!("expected a connection, got {second:?}");
    };
    assert_eq!((conn.source.as_str(), conn.target.as_str()), (a.as_str(), b.as_str()));
    assert_eq!(conn.anchors, Some([Anchor::RIGHT, Anchor::LEFT]));
    assert!(s.ui().pending_connect.is_none());
}

#[test]
fn connect_tool_duplicate_shows_notice_and_alt_forces() {
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    s.add_card(Some(pt(400.0, 0.0)));
    s.set_tool(Tool::Connect);
    click(&mut s, 230.0, 80.0, no_modifiers());
    click(&mut s, 410.0, 80.0, no_modifiers());
    click(&mut s, 410.0, 80.0, no_modifiers());
    let declined = click(&mut s, 230.0, 80.0, no_modifiers());
    let Action::Notice(message) = &declined[0] else {
        panic!("expected a notice, got {declined:?}");
    };
    assert!(message.contains("already exists"));
    assert_eq!(s.doc().connections.active_len(), 1);

    click(&mut s, 410.0, 80.0, no_modifiers());
    let forced = click(&mut s, 230.0, 80.0, alt());
    assert!(matches!(forced[0], Action::ConnectionCreated(_)));
    assert_eq!(s.doc().connections.active_len(), 2);
}

#[test]
fn connect_tool_cancels_on_empty_canvas_escape_or_same_entity() {
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    s.set_tool(Tool::Connect);

    click(&mut s, 10.0, 10.0, no_modifiers());
    click(&mut s, 1000.0, 1000.0, no_modifiers());
    assert!(s.ui().pending_connect.is_none());

    click(&mut s, 10.0, 10.0, no_modifiers());
    s.on_key_down(&escape(), no_modifiers());
    assert!(s.ui().pending_connect.is_none());

    click(&mut s, 10.0, 10.0, no_modifiers());
    click(&mut s, 20.0, 20.0, no_modifiers());
    assert!(s.ui().pending_connect.is_none());
    assert_eq!(s.doc().connections.active_len(), 0);
}

#[test]
fn switching_tool_drops_pending_source() {
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    s.set_tool(Tool::Connect);
    click(&mut s, 10.0, 10.0, no_modifiers());
    s.set_tool(Tool::Select);
    assert!(s.ui().pending_connect.is_none());
}

#[test]
fn delete_connection_detaches_and_hides_from_json() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    assert!(s.delete_connection(&conn.id));
    assert!(!s.delete_connection(&conn.id));
    assert!(s.doc().connections.is_pending_delete(&conn.id));
    assert!(s.handle_for(&conn.id).is_none());
    assert!(!s.doc().to_json().unwrap().contains(&conn.id));
    assert!(s.connect(&a, &b, false).is_ok());
}

#[test]
fn redraw_all_retries_detach_and_reconnects() {
    let connector = RecordingConnector { fail_removes: 2, ..Default::default() };
    let mut s = session_with(connector, EditorConfig::default());
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    let first = s.handle_for(&conn.id).unwrap();
    s.redraw_all();
    assert_eq!(s.connector().remove_calls, 3);
    assert_eq!(s.connector().removed, vec![first]);
    assert_eq!(s.connector().connects.len(), 2);
    assert_ne!(s.handle_for(&conn.id), Some(first));
    assert_eq!(s.doc().connections.all().len(), 1);
}

// =============================================================
// Layout
// =============================================================

#[test]
fn align_selected_left() {
    let mut s = session();
    let a = s.add_card(Some(pt(10.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 200.0)));
    click(&mut s, 20.0, 10.0, no_modifiers());
    click(&mut s, 310.0, 210.0, shift());
    let repaints = s.connector().repaints;
    assert!(s.align_selected(Align::Left));
    assert_eq!(card_pos(&s, &b).0, 10.0);
    assert_eq!(card_pos(&s, &a).0, 10.0);
    assert!(s.connector().repaints > repaints);
}

#[test]
fn align_needs_two_selected_and_feature_enabled() {
    let mut s = session();
    s.add_card(Some(pt(10.0, 0.0)));
    assert!(!s.align_selected(Align::Left));

    let config = EditorConfig { align_enabled: false, ..Default::default() };
    let mut s = session_with(RecordingConnector::default(), config);
    s.add_card(Some(pt(10.0, 0.0)));
    s.add_card(Some(pt(300.0, 200.0)));
    click(&mut s, 20.0, 10.0, no_modifiers());
    click(&mut s, 310.0, 210.0, shift());
    assert!(!s.align_selected(Align::Left));
    assert!(!s.distribute_selected(Axis::Horizontal));
}

#[test]
fn align_moves_card_off_its_rail() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    s.add_card(Some(pt(300.0, 0.0)));
    s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    drag(&mut s, pt(10.0, 10.0), pt(10.0, 290.0));
    click(&mut s, 10.0, 320.0, no_modifiers());
    click(&mut s, 310.0, 10.0, shift());
    assert!(s.align_selected(Align::Top));
    assert_eq!(card_pos(&s, &a).1, 0.0);
    assert!(s.doc().card(&a).unwrap().attached_rail.is_none());
}

#[test]
fn distribute_selected_horizontally() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(100.0, 0.0)));
    let c = s.add_card(Some(pt(400.0, 0.0)));
    for id in [&a, &b, &c] {
        assert!(s.set_card_size(id, 50.0, 50.0));
    }
    click(&mut s, 10.0, 10.0, no_modifiers());
    click(&mut s, 110.0, 10.0, shift());
    click(&mut s, 410.0, 10.0, shift());
    assert!(s.distribute_selected(Axis::Horizontal));
    assert_eq!(card_pos(&s, &a).0, 0.0);
    assert_eq!(card_pos(&s, &b).0, 200.0);
    assert_eq!(card_pos(&s, &c).0, 400.0);
}

// =============================================================
// Load and save
// =============================================================

#[test]
fn save_then_load_round_trips_the_map() {
    let mut store = MemoryStore::new();
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    s.connect(&a, &b, false).unwrap();
    assert_eq!(s.save_to(&mut store, "map-1").unwrap(), 0);
    assert_eq!(s.map_id(), Some("map-1"));

    let mut other = session();
    other.load_from(&store, "map-1").unwrap();
    assert_eq!(other.doc().nodes.len(), 2);
    assert_eq!(other.doc().connections.active_len(), 1);
    assert_eq!(other.connector().connects.len(), 1);
}

#[test]
fn unsaved_connection_delete_is_undone_by_reload() {
    let mut store = MemoryStore::new();
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    s.save_to(&mut store, "m").unwrap();
    s.delete_connection(&conn.id);
    s.load_from(&store, "m").unwrap();
    assert_eq!(s.doc().connections.active_len(), 1);
    assert!(s.handle_for(&conn.id).is_some());
}

#[test]
fn successful_save_commits_pending_deletes() {
    let mut store = MemoryStore::new();
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    s.delete_connection(&conn.id);
    assert_eq!(s.save_to(&mut store, "m").unwrap(), 1);
    assert!(s.doc().connections.all().is_empty());
    let stored = MapDocument::from_json_lenient(store.get("m").unwrap());
    assert_eq!(stored.connections.active_len(), 0);
}

#[test]
fn zero_length_rail_survives_connect_save_and_reload() {
    let mut store = MemoryStore::new();
    store.insert(
        "m",
        r#"{"nodes":[{"id":"c1","x":-20,"y":200}],"rails":[{"id":"r1","x":100,"y":0,"orientation":"horizontal","width":0}]}"#,
    );
    let mut s = session();
    s.load_from(&store, "m").unwrap();
    let conn = s.connect("c1", "r1", false).unwrap();
    // rail lengthened to 60 on load; card center x = 100 sits at the rail's start
    assert_eq!(conn.anchors, Some([Anchor::CONTINUOUS, Anchor::precise(0.0, 1.0, 0.0, 1.0)]));
    s.save_to(&mut store, "m").unwrap();

    s.load_from(&store, "m").unwrap();
    assert_eq!(s.doc().nodes.len(), 1);
    assert_eq!(s.doc().rails.len(), 1);
    assert_eq!(s.doc().connections.active_len(), 1);
}

#[test]
fn second_save_while_in_flight_is_rejected() {
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    let pending = s.begin_save("m").unwrap();
    assert!(s.is_saving());
    assert!(matches!(s.begin_save("m"), Err(SessionError::SaveInFlight)));
    assert_eq!(s.complete_save(pending, Ok(())).unwrap(), 0);
    assert!(!s.is_saving());
    assert!(s.begin_save("m").is_ok());
}

#[test]
fn failed_save_leaves_everything_pending() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let conn = s.connect(&a, &b, false).unwrap();
    s.delete_connection(&conn.id);
    let err = s.save_to(&mut BrokenStore, "m").unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Unavailable(_))));
    assert!(!s.is_saving());
    assert!(s.doc().connections.is_pending_delete(&conn.id));
    assert_eq!(s.doc().nodes.len(), 2);
    assert!(s.map_id().is_none());
}

#[test]
fn deletes_marked_during_a_save_stay_pending() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let b = s.add_card(Some(pt(300.0, 0.0)));
    let c = s.add_card(Some(pt(0.0, 300.0)));
    let ab = s.connect(&a, &b, false).unwrap();
    let ac = s.connect(&a, &c, false).unwrap();
    s.delete_connection(&ab.id);
    let pending = s.begin_save("m").unwrap();
    s.delete_connection(&ac.id);
    assert_eq!(s.complete_save(pending, Ok(())).unwrap(), 1);
    assert!(s.doc().connections.get(&ab.id).is_none());
    assert!(s.doc().connections.is_pending_delete(&ac.id));
}

#[test]
fn save_superseded_by_load_is_stale() {
    let mut s = session();
    let pending = s.begin_save("m").unwrap();
    s.load_json("{}");
    assert!(matches!(s.complete_save(pending, Ok(())), Err(SessionError::StaleSave)));
}

#[test]
fn load_failure_keeps_the_session() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let err = s.load_from(&BrokenStore, "m").unwrap_err();
    assert!(matches!(err, SessionError::Store(_)));
    assert!(s.doc().card(&a).is_some());
}

#[test]
fn missing_or_corrupt_map_loads_empty() {
    let mut store = MemoryStore::new();
    store.insert("bad", "{not json");
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    s.load_from(&store, "bad").unwrap();
    assert!(s.doc().nodes.is_empty());
    s.add_card(Some(pt(0.0, 0.0)));
    s.load_from(&store, "never-saved").unwrap();
    assert!(s.doc().nodes.is_empty());
    assert_eq!(s.map_id(), Some("never-saved"));
}

#[test]
fn load_resets_selection_and_gestures() {
    let mut s = session();
    s.add_card(Some(pt(0.0, 0.0)));
    s.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers());
    s.load_json(r#"{"nodes":[{"id":"x","x":0,"y":0}]}"#);
    assert!(s.selection().is_empty());
    assert!(s.input().is_idle());
    assert!(s.doc().card("x").is_some());
}

// =============================================================
// Programmatic selection and resnap
// =============================================================

#[test]
fn set_selection_keeps_only_known_cards() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    let r = s.add_rail(Orientation::Horizontal, Some(pt(0.0, 300.0)));
    let actions = s.set_selection(&[a.clone(), r, "ghost".into(), a.clone()]);
    assert_eq!(actions, vec![Action::SelectionChanged(vec![a.clone()])]);
    assert_eq!(s.selection().ids(), &[a][..]);
}

#[test]
fn resnap_all_puts_cards_back_on_rails() {
    let mut s = session();
    let a = s.add_card(Some(pt(0.0, 0.0)));
    s.load_json(&format!(
        r#"{{"nodes":[{{"id":"{a}","x":0,"y":999,"attachedRail":"r"}}],"rails":[{{"id":"r","x":0,"y":300,"orientation":"horizontal","width":400}}]}}"#
    ));
    assert_eq!(s.resnap_all(), 1);
    assert_eq!(card_pos(&s, &a).1, 312.0);
}
