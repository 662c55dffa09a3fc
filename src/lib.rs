// src/lib.rs
// Herald - rotating per-recipient announcements for independently loaded extensions

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod announcement;
pub mod config;
pub mod delivery;
pub mod error;
pub mod license;
pub mod producer;
pub mod recipient;
pub mod scheduler;
pub mod store;
pub mod tracker;

pub use announcement::{ANNOUNCEMENT_KEY, Announcement, OwnerToken};
pub use config::{RotationConfig, Settings};
pub use delivery::{Delivery, DeliveryChannel, DisplayMode, ForwardingChannel, TracingChannel};
pub use error::{HeraldError, Result};
pub use license::{DescriptorFile, LicenseRegistry, ProducerDescriptor};
pub use producer::Producer;
pub use recipient::RecipientId;
pub use scheduler::{SchedulerHandle, SchedulerState};
pub use store::{AttachmentStore, InMemoryAttachmentStore};
pub use tracker::{AnnounceOutcome, DisconnectSummary, RecipientTracker};
