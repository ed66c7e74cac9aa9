#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use serde_json::json;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults() {
    let config = EditorConfig::default();
    assert_eq!(config.snap_threshold, 40.0);
    assert_eq!(config.line_style, "solid");
    assert!(config.drag_enabled);
    assert!(config.align_enabled);
    assert_eq!(config.card_size(), Size::new(240.0, 160.0));
}

#[test]
fn from_settings_reads_typed_values() {
    let config = EditorConfig::from_settings(&json!({
        "line_color": "#ff0000",
        "line_thickness": 3,
        "line_style": "dashed",
        "snap_threshold": 25.5,
        "enable_drag": false,
        "enable_align": true,
    }));
    assert_eq!(config.line_color, "#ff0000");
    assert_eq!(config.line_thickness, 3.0);
    assert_eq!(config.line_style, "dashed");
    assert_eq!(config.snap_threshold, 25.5);
    assert!(!config.drag_enabled);
    assert!(config.align_enabled);
}

#[test]
fn from_settings_coerces_strings() {
    let config = EditorConfig::from_settings(&json!({
        "line_thickness": " 4 ",
        "snap_threshold": "60",
        "enable_drag": "0",
        "enable_align": "yes",
        "card_width": "200",
    }));
    assert_eq!(config.line_thickness, 4.0);
    assert_eq!(config.snap_threshold, 60.0);
    assert!(!config.drag_enabled);
    assert!(config.align_enabled);
    assert_eq!(config.default_card_width, 200.0);
}

#[test]
fn from_settings_numeric_bools() {
    let config = EditorConfig::from_settings(&json!({ "enable_drag": 0, "enable_align": 1 }));
    assert!(!config.drag_enabled);
    assert!(config.align_enabled);
}

#[test]
fn from_settings_falls_back_on_garbage() {
    let config = EditorConfig::from_settings(&json!({
        "line_color": "   ",
        "line_thickness": -2,
        "snap_threshold": "wide",
        "enable_drag": "maybe",
        "card_height": [],
    }));
    assert_eq!(config, EditorConfig::default());
}

#[test]
fn from_settings_missing_threshold_is_forty() {
    let config = EditorConfig::from_settings(&json!({ "line_color": "#000" }));
    assert_eq!(config.snap_threshold, 40.0);
}

#[test]
fn from_settings_non_object_is_default() {
    assert_eq!(EditorConfig::from_settings(&json!("nope")), EditorConfig::default());
    assert_eq!(EditorConfig::from_settings(&Value::Null), EditorConfig::default());
}

#[test]
fn overrides_apply_valid_values() {
    let config = EditorConfig::default().with_overrides(lookup_from(&[
        ("CARDMAP_SNAP_THRESHOLD", "55"),
        ("CARDMAP_LINE_THICKNESS", "1.5"),
        ("CARDMAP_LINE_COLOR", "#123456"),
        ("CARDMAP_LINE_STYLE", "dotted"),
    ]));
    assert_eq!(config.snap_threshold, 55.0);
    assert_eq!(config.line_thickness, 1.5);
    assert_eq!(config.line_color, "#123456");
    assert_eq!(config.line_style, "dotted");
}

#[test]
fn overrides_ignore_malformed_values() {
    let config = EditorConfig::default().with_overrides(lookup_from(&[
        ("CARDMAP_SNAP_THRESHOLD", "lots"),
        ("CARDMAP_LINE_THICKNESS", "0"),
        ("CARDMAP_LINE_COLOR", ""),
    ]));
    assert_eq!(config, EditorConfig::default());
}

#[test]
fn unset_environment_variable_is_no_override() {
    assert_eq!(env_lookup("CARDMAP_TEST_SURELY_UNSET_VARIABLE"), None);
}
