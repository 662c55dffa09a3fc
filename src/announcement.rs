// src/announcement.rs
// Announcement payloads and the owner tokens that tag them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known attachment key under which every producer queues announcements
pub const ANNOUNCEMENT_KEY: &str = "herald.announcements";

/// Identifies the producer that created an announcement.
///
/// Producers never remove each other's entries; removal is always scoped to
/// the first entry carrying a given token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerToken(String);

impl OwnerToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable rendered text waiting to be shown to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub owner: OwnerToken,
    pub text: String,
    pub enqueued_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(owner: OwnerToken, text: impl Into<String>) -> Self {
        Self {
            owner,
            text: text.into(),
            enqueued_at: Utc::now(),
        }
    }

    /// How long this announcement has been waiting
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.enqueued_at
    }
}
