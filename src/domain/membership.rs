//! The set of registered clients.
//!
//! [`Membership`] is deliberately a plain, non-synchronised map: it is owned
//! by the pool control loop and never shared, so every mutation is already
//! serialised by the loop itself.

use std::collections::HashMap;

use super::{ClientId, ConnectionWriter};

/// Registered clients keyed by identity, with O(1) membership tests.
#[derive(Debug, Default)]
pub struct Membership {
    members: HashMap<ClientId, ConnectionWriter>,
}

impl Membership {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client. Returns `false` if it was already present, in which
    /// case the stored writer is replaced.
    pub fn insert(&mut self, id: ClientId, writer: ConnectionWriter) -> bool {
        self.members.insert(id, writer).is_none()
    }

    /// Removes a client. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &ClientId) -> bool {
        self.members.remove(id).is_some()
    }

    /// Returns `true` if the client is registered.
    #[must_use]
    pub fn contains(&self, id: &ClientId) -> bool {
        self.members.contains_key(id)
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if nobody is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates over members in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &ConnectionWriter)> {
        self.members.iter()
    }
}
