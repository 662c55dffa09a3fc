// src/store.rs
// Host-provided per-recipient attachment store

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::announcement::{Announcement, OwnerToken};
use crate::recipient::RecipientId;

/// Per-recipient, per-key ordered list of owner-tagged values.
///
/// Implementations only need to be internally consistent per call; the
/// coordinator serializes read-modify-write sequences per recipient.
pub trait AttachmentStore: Send + Sync {
    /// Ordered entries for `recipient` under `key` (empty if none)
    fn get(&self, recipient: &RecipientId, key: &str) -> Vec<Announcement>;

    /// Append an entry at the tail
    fn add(&self, recipient: &RecipientId, key: &str, announcement: Announcement);

    /// Remove the first entry owned by `owner`, returning it if present
    fn remove(&self, recipient: &RecipientId, key: &str, owner: &OwnerToken) -> Option<Announcement>;

    /// Drop every entry under `key`, returning how many were removed
    fn purge(&self, recipient: &RecipientId, key: &str) -> usize {
        let mut removed = 0;
        for entry in self.get(recipient, key) {
            if self.remove(recipient, key, &entry.owner).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Head entry under `key`
    fn first(&self, recipient: &RecipientId, key: &str) -> Option<Announcement> {
        self.get(recipient, key).into_iter().next()
    }

    fn is_empty(&self, recipient: &RecipientId, key: &str) -> bool {
        self.get(recipient, key).is_empty()
    }
}

type Slot = (RecipientId, String);

/// In-process attachment store used by the bundled host and tests
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    slots: RwLock<HashMap<Slot, Vec<Announcement>>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recipient/key slots currently holding entries
    pub fn slot_count(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn get(&self, recipient: &RecipientId, key: &str) -> Vec<Announcement> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(*recipient, key.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn add(&self, recipient: &RecipientId, key: &str, announcement: Announcement) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((*recipient, key.to_string()))
            .or_default()
            .push(announcement);
    }

    fn remove(&self, recipient: &RecipientId, key: &str, owner: &OwnerToken) -> Option<Announcement> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = (*recipient, key.to_string());
        let entries = slots.get_mut(&slot)?;
        let index = entries.iter().position(|a| &a.owner == owner)?;
        let removed = entries.remove(index);
        // Empty slots are dropped so disconnected recipients leave nothing behind
        if entries.is_empty() {
            slots.remove(&slot);
        }
        Some(removed)
    }

    fn purge(&self, recipient: &RecipientId, key: &str) -> usize {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(*recipient, key.to_string()))
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}
