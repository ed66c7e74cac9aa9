//! Editor settings read from the host's stored options.
//!
//! Settings arrive as an untyped JSON object saved by a settings form, so
//! values are coerced leniently: numbers may be strings, booleans may be
//! `"1"`/`"yes"`/`"on"`. Anything unusable falls back to the default.
//!
//! Environment overrides:
//! - `CARDMAP_SNAP_THRESHOLD`
//! - `CARDMAP_LINE_THICKNESS`
//! - `CARDMAP_LINE_COLOR`
//! - `CARDMAP_LINE_STYLE`

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::env::VarError;
use std::str::FromStr;

use serde_json::Value;
use tracing::warn;

use crate::bounds::Size;
use crate::consts::{DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH, DEFAULT_SNAP_THRESHOLD};

pub const DEFAULT_LINE_COLOR: &str = "#555555";
pub const DEFAULT_LINE_THICKNESS: f64 = 2.0;
pub const DEFAULT_LINE_STYLE: &str = "solid";

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub line_color: String,
    pub line_thickness: f64,
    /// Style key for new connections.
    pub line_style: String,
    /// World-unit distance within which a dragged card snaps to a rail.
    pub snap_threshold: f64,
    pub drag_enabled: bool,
    pub align_enabled: bool,
    pub default_card_width: f64,
    pub default_card_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            line_color: DEFAULT_LINE_COLOR.to_owned(),
            line_thickness: DEFAULT_LINE_THICKNESS,
            line_style: DEFAULT_LINE_STYLE.to_owned(),
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            drag_enabled: true,
            align_enabled: true,
            default_card_width: DEFAULT_CARD_WIDTH,
            default_card_height: DEFAULT_CARD_HEIGHT,
        }
    }
}

impl EditorConfig {
    /// Build from a stored settings object.
    ///
    /// Recognized keys: `line_color`, `line_thickness`, `line_style`,
    /// `snap_threshold`, `enable_drag`, `enable_align`, `card_width`,
    /// `card_height`. Unknown keys are ignored; a non-object yields defaults.
    #[must_use]
    pub fn from_settings(settings: &Value) -> Self {
        let defaults = Self::default();
        let get = |key: &str| settings.get(key);
        Self {
            line_color: coerce_string(get("line_color")).unwrap_or(defaults.line_color),
            line_thickness: coerce_positive(get("line_thickness")).unwrap_or(defaults.line_thickness),
            line_style: coerce_string(get("line_style")).unwrap_or(defaults.line_style),
            snap_threshold: coerce_positive(get("snap_threshold")).unwrap_or(defaults.snap_threshold),
            drag_enabled: coerce_bool(get("enable_drag")).unwrap_or(defaults.drag_enabled),
            align_enabled: coerce_bool(get("enable_align")).unwrap_or(defaults.align_enabled),
            default_card_width: coerce_positive(get("card_width")).unwrap_or(defaults.default_card_width),
            default_card_height: coerce_positive(get("card_height")).unwrap_or(defaults.default_card_height),
        }
    }

    /// Apply `CARDMAP_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env_lookup)
    }

    /// Apply overrides from `lookup`; malformed values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(threshold) = parse_var::<f64>(&lookup, "CARDMAP_SNAP_THRESHOLD").filter(|v| *v > 0.0) {
            self.snap_threshold = threshold;
        }
        if let Some(thickness) = parse_var::<f64>(&lookup, "CARDMAP_LINE_THICKNESS").filter(|v| *v > 0.0) {
            self.line_thickness = thickness;
        }
        if let Some(color) = lookup("CARDMAP_LINE_COLOR").filter(|v| !v.trim().is_empty()) {
            self.line_color = color.trim().to_owned();
        }
        if let Some(style) = lookup("CARDMAP_LINE_STYLE").filter(|v| !v.trim().is_empty()) {
            self.line_style = style.trim().to_owned();
        }
        self
    }

    /// Size used for cards without a stored size.
    #[must_use]
    pub fn card_size(&self) -> Size {
        Size::new(self.default_card_width, self.default_card_height)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) => Some(value),
        Err(VarError::NotPresent) => None,
        Err(error @ VarError::NotUnicode(_)) => {
            warn!(key, %error, "ignoring environment override");
            None
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    if let Ok(value) = raw.trim().parse::<T>() {
        return Some(value);
    }
    warn!(key, value = %raw, "ignoring malformed environment override");
    None
}

fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            if let Ok(n) = s.trim().parse::<f64>() {
                Some(n)
            } else {
                warn!(value = %s, "setting is not a number; using default");
                None
            }
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn coerce_positive(value: Option<&Value>) -> Option<f64> {
    coerce_number(value).filter(|n| *n > 0.0)
}

fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    }
}
