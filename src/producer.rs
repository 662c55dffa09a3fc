// src/producer.rs
// Announcement producer: one per independently loaded extension

use tracing::info;
use uuid::Uuid;

use crate::announcement::OwnerToken;
use crate::error::Result;
use crate::license::ProducerDescriptor;
use crate::recipient::RecipientId;
use crate::tracker::{AnnounceOutcome, RecipientTracker};

/// An extension that wants to show each connecting recipient one announcement.
///
/// Producers know nothing about each other; they only share the tracker.
pub struct Producer {
    descriptor: ProducerDescriptor,
    owner: OwnerToken,
    tracker: RecipientTracker,
}

impl Producer {
    pub fn new(descriptor: ProducerDescriptor, tracker: RecipientTracker) -> Result<Self> {
        descriptor.validate()?;
        // Two instances of the same extension still get distinct tokens
        let owner = OwnerToken::new(format!(
            "{}#{}",
            descriptor.command_alias(),
            &Uuid::new_v4().simple().to_string()[..8]
        ));
        Ok(Self {
            descriptor,
            owner,
            tracker,
        })
    }

    pub fn owner(&self) -> &OwnerToken {
        &self.owner
    }

    pub fn descriptor(&self) -> &ProducerDescriptor {
        &self.descriptor
    }

    pub fn informs_users(&self) -> bool {
        self.descriptor.inform_user
    }

    /// Queue `text` for `recipient`; starts the rotation if nobody drives it yet
    pub fn announce(&self, recipient: &RecipientId, text: impl Into<String>) -> Result<AnnounceOutcome> {
        self.tracker.announce(recipient, &self.owner, text)
    }

    /// Connection hook: announce this producer's license line if it must
    /// inform users. Returns `None` when it has nothing to say.
    pub fn on_connect(&self, recipient: &RecipientId) -> Result<Option<AnnounceOutcome>> {
        if !self.informs_users() {
            return Ok(None);
        }
        self.announce(recipient, self.descriptor.announcement_text())
            .map(Some)
    }

    /// Log license details once when the producer is loaded
    pub fn log_startup(&self) {
        let d = &self.descriptor;
        if let Some(license) = &d.license {
            info!(producer = %d.name, "This plugin is licensed under the terms of the {}.", license);
        }
        let alias = d.command_alias();
        match (d.license_terms.is_some(), d.source.is_some()) {
            (true, true) => info!(producer = %d.name, "More info about the plugin like the license and the source: /{} info", alias),
            (true, false) => info!(producer = %d.name, "More info about the plugin like the license: /{} info", alias),
            (false, true) => info!(producer = %d.name, "More info about the plugin like the source: /{} info", alias),
            (false, false) => {}
        }
    }
}
