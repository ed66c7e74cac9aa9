//! Id generation for new cards, rails and connections.

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;

use uuid::Uuid;

/// Produces unique ids. Injected into the session so tests can use
/// [`SequentialIds`] and get predictable output.
pub trait IdGenerator {
    /// Return a new id starting with `prefix` (`card`, `rail`, `conn`).
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random v4 UUIDs: `card-0b6e...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }
}

/// Monotonic counter: `card-1`, `rail-2`, `conn-3`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}-{}", self.next)
    }
}
