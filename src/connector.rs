//! The external connector-drawing capability.
//!
//! The engine never draws lines. It tells a [`Connector`] what to join, at
//! which anchors, and when to repaint; the host implements the trait over
//! whatever library renders the paths.

#[cfg(test)]
#[path = "connector_test.rs"]
mod connector_test;

use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::doc::Anchor;

/// Opaque handle the connector returns for a drawn connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u64);

/// Visual parameters handed to the connector with every line.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    /// Line-style key (`solid`, `dashed`, ...).
    pub key: String,
    pub color: String,
    pub thickness: f64,
}

impl StyleConfig {
    /// Style for a connection with `key`, using configured color and
    /// thickness. An empty key means the configured default.
    #[must_use]
    pub fn for_key(key: &str, config: &EditorConfig) -> Self {
        let key = if key.is_empty() { config.line_style.clone() } else { key.to_owned() };
        Self { key, color: config.line_color.clone(), thickness: config.line_thickness }
    }
}

pub trait Connector {
    /// Draw a line between two entities. `None` when the connector could
    /// not attach (for example an element is not mounted).
    fn connect(
        &mut self,
        source: &str,
        target: &str,
        anchors: [Anchor; 2],
        style: &StyleConfig,
    ) -> Option<ConnectionHandle>;

    /// Detach a drawn line. Returns `true` once the handle is gone.
    fn remove(&mut self, handle: ConnectionHandle) -> bool;

    /// Recompute every drawn path from current element positions.
    fn repaint_all(&mut self);

    /// Tell the connector the canvas scale changed.
    fn set_zoom(&mut self, scale: f64);
}

/// Detach `handle`, retrying up to `max_attempts` times.
///
/// Returns `true` once the connector reports the handle gone. After the
/// last failed attempt the failure is logged and `false` returned; the
/// caller forgets the handle either way.
pub fn ensure_detached(connector: &mut dyn Connector, handle: ConnectionHandle, max_attempts: usize) -> bool {
    for attempt in 1..=max_attempts {
        if connector.remove(handle) {
            if attempt > 1 {
                debug!(handle = handle.0, attempt, "connector detached after retry");
            }
            return true;
        }
    }
    warn!(handle = handle.0, attempts = max_attempts, "connector handle still attached after retries");
    false
}

/// Connector that draws nothing. Used by the CLI and headless sessions.
#[derive(Debug, Default)]
pub struct NullConnector {
    next: u64,
}

impl Connector for NullConnector {
    fn connect(&mut self, _: &str, _: &str, _: [Anchor; 2], _: &StyleConfig) -> Option<ConnectionHandle> {
        self.next += 1;
        Some(ConnectionHandle(self.next))
    }

    fn remove(&mut self, _: ConnectionHandle) -> bool {
        true
    }

    fn repaint_all(&mut self) {}

    fn set_zoom(&mut self, _: f64) {}
}
