//! Connection registry: the authoritative list of connections.
//!
//! DESIGN
//! ======
//! A user delete only marks a connection pending; it stays in the list (but
//! out of `active()` and out of serialized output) until a save succeeds and
//! the caller commits. Reloading before that brings it back. Entity deletes
//! are different: the entity is gone, so its connections are removed at once.
//!
//! At most one active connection may join an unordered pair unless the
//! caller explicitly asks for a parallel one. The rule is checked at
//! creation only; loaded documents are taken as-is.

#[cfg(test)]
#[path = "connections_test.rs"]
mod connections_test;

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::doc::{Anchor, Connection, EntityId};
use crate::ids::IdGenerator;

/// Why a connection was not created. The message is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("connection already exists between {from} and {to}; hold Alt to add a parallel one")]
    Duplicate { from: EntityId, to: EntityId },
    #[error("cannot connect unknown item {0}")]
    UnknownEntity(EntityId),
    #[error("cannot connect {0} to itself")]
    SelfConnection(EntityId),
}

/// Parameters for [`ConnectionRegistry::create`].
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    pub source: EntityId,
    pub target: EntityId,
    pub style: String,
    pub anchors: Option<[Anchor; 2]>,
    /// Allow a second connection between an already-connected pair.
    pub allow_parallel: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Vec<Connection>,
    pending_delete: BTreeSet<String>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new connection unless the pair is already joined.
    ///
    /// Nothing changes on failure.
    ///
    /// # Errors
    ///
    /// [`ConnectError::SelfConnection`] when both ends are the same entity,
    /// [`ConnectError::Duplicate`] when an active connection already joins
    /// the pair and `allow_parallel` is false.
    pub fn create(&mut self, ids: &mut dyn IdGenerator, request: ConnectionRequest) -> Result<&Connection, ConnectError> {
        if request.source == request.target {
            return Err(ConnectError::SelfConnection(request.source));
        }
        if !request.allow_parallel && self.exists_active(&request.source, &request.target) {
            return Err(ConnectError::Duplicate { from: request.source, to: request.target });
        }
        let index = self.connections.len();
        self.connections.push(Connection {
            id: ids.next_id("conn"),
            source: request.source,
            target: request.target,
            style: request.style,
            anchors: request.anchors,
        });
        Ok(&self.connections[index])
    }

    /// Whether an active connection joins `a` and `b` in either direction.
    #[must_use]
    pub fn exists_active(&self, a: &str, b: &str) -> bool {
        self.active().any(|c| c.links(a, b))
    }

    /// Soft-delete a connection. Returns `false` for unknown or already
    /// pending ids.
    pub fn mark_pending_delete(&mut self, id: &str) -> bool {
        if !self.connections.iter().any(|c| c.id == id) {
            return false;
        }
        self.pending_delete.insert(id.to_owned())
    }

    /// Permanently remove every connection touching `entity_id`.
    pub fn remove_for_entity(&mut self, entity_id: &str) -> Vec<Connection> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.connections).into_iter().partition(|c| c.references(entity_id));
        self.connections = kept;
        for conn in &removed {
            self.pending_delete.remove(&conn.id);
        }
        removed
    }

    /// Drop every pending-delete connection for good. Call only after a
    /// save has been acknowledged.
    pub fn commit_pending_deletes(&mut self) -> Vec<Connection> {
        let pending = std::mem::take(&mut self.pending_delete);
        self.drop_ids(&pending)
    }

    /// Commit only `ids`; other pending deletes stay pending.
    pub fn commit_deletes(&mut self, ids: &BTreeSet<String>) -> Vec<Connection> {
        let committing: BTreeSet<String> = ids.intersection(&self.pending_delete).cloned().collect();
        for id in &committing {
            self.pending_delete.remove(id);
        }
        self.drop_ids(&committing)
    }

    fn drop_ids(&mut self, ids: &BTreeSet<String>) -> Vec<Connection> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.connections).into_iter().partition(|c| ids.contains(&c.id));
        self.connections = kept;
        removed
    }

    /// Connections not pending delete, in creation order.
    pub fn active(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| !self.pending_delete.contains(&c.id))
    }

    /// Every connection including pending deletes.
    #[must_use]
    pub fn all(&self) -> &[Connection] {
        &self.connections
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn is_pending_delete(&self, id: &str) -> bool {
        self.pending_delete.contains(id)
    }

    #[must_use]
    pub fn pending_deletes(&self) -> &BTreeSet<String> {
        &self.pending_delete
    }

    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active().count()
    }
}

impl Serialize for ConnectionRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.active())
    }
}

impl<'de> Deserialize<'de> for ConnectionRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let connections = Vec::<Connection>::deserialize(deserializer)?;
        Ok(Self { connections, pending_delete: BTreeSet::new() })
    }
}
