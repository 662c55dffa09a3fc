// src/recipient.rs
// Opaque identity of a connected recipient

use std::fmt;
use uuid::Uuid;

/// Globally unique identity of a connected entity.
///
/// Identities may be reused across visits (a reconnecting user keeps its id),
/// which is why every trace of a recipient is purged on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipientId(Uuid);

impl RecipientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecipientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for RecipientId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
