//! Identifier newtypes shared across the federation crates

use serde::{Deserialize, Serialize};

/// Identifier of one virtual client (household group) in the federation.
///
/// Clients are numbered densely from 0 in partition order, so the id
/// doubles as an index into per-client collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(u32);

impl ClientId {
    /// Creates a new client identifier
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns the identifier as a collection index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

impl From<u32> for ClientId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<ClientId> for u32 {
    fn from(id: ClientId) -> u32 {
        id.0
    }
}
