// src/tracker.rs
// Recipient lifecycle tracker and per-recipient driver election
//
// Every connected recipient owns a Session. Its mutex serializes queue
// read-modify-write and driver election, so producers on any thread can
// announce concurrently and at most one scheduler runs per recipient.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::announcement::{ANNOUNCEMENT_KEY, Announcement, OwnerToken};
use crate::config::RotationConfig;
use crate::delivery::DeliveryChannel;
use crate::error::{HeraldError, Result};
use crate::recipient::RecipientId;
use crate::scheduler::{RotationScheduler, SchedulerHandle};
use crate::store::AttachmentStore;

/// Mutable per-recipient state guarded by the session lock
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) driver: Option<SchedulerHandle>,
    /// A head entry has been taken and is being delivered
    pub(crate) in_flight: bool,
}

impl SessionState {
    /// Deregister `handle` if it is still the registered driver
    pub(crate) fn release(&mut self, handle: &SchedulerHandle) {
        if self.driver.as_ref().is_some_and(|d| d.id() == handle.id()) {
            self.driver = None;
        }
    }

    pub(crate) fn live_driver(&self) -> Option<&SchedulerHandle> {
        self.driver.as_ref().filter(|d| !d.is_cancelled())
    }
}

/// One visit of one recipient
#[derive(Debug)]
pub struct Session {
    recipient: RecipientId,
    connected: AtomicBool,
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new(recipient: RecipientId) -> Self {
        Self {
            recipient,
            connected: AtomicBool::new(true),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn recipient(&self) -> RecipientId {
        self.recipient
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the visit over and cancel its driver, returning it if one was live
    pub(crate) fn disconnect(&self) -> Option<SchedulerHandle> {
        let mut state = self.lock();
        self.connected.store(false, Ordering::Release);
        let driver = state.driver.take();
        if let Some(ref handle) = driver {
            handle.cancel();
        }
        driver
    }
}

/// Result of a successful `announce`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// This producer won the election and started the recipient's scheduler
    Driver(SchedulerHandle),
    /// A scheduler was already live; the entry waits at `position` (0 = head)
    Queued { position: usize },
}

impl AnnounceOutcome {
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

/// What `on_disconnect` cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisconnectSummary {
    pub cancelled_driver: bool,
    pub purged: usize,
}

struct Inner {
    store: Arc<dyn AttachmentStore>,
    channel: Arc<dyn DeliveryChannel>,
    rotation: RotationConfig,
    sessions: Mutex<HashMap<RecipientId, Arc<Session>>>,
}

/// Tracks connected recipients and owns their scheduler handles.
///
/// Cheap to clone; all clones share the same state. Hand one to every
/// producer.
#[derive(Clone)]
pub struct RecipientTracker {
    inner: Arc<Inner>,
}

impl RecipientTracker {
    pub fn new(
        store: Arc<dyn AttachmentStore>,
        channel: Arc<dyn DeliveryChannel>,
        rotation: RotationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                channel,
                rotation,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn rotation(&self) -> &RotationConfig {
        &self.inner.rotation
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<RecipientId, Arc<Session>>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self, recipient: &RecipientId) -> Option<Arc<Session>> {
        self.sessions().get(recipient).cloned()
    }

    /// Register a connecting recipient. Returns false if it was already connected.
    pub fn on_connect(&self, recipient: RecipientId) -> bool {
        let mut sessions = self.sessions();
        if sessions.contains_key(&recipient) {
            debug!(recipient = %recipient, "Recipient already connected");
            return false;
        }
        sessions.insert(recipient, Arc::new(Session::new(recipient)));
        debug!(recipient = %recipient, "Recipient connected");
        true
    }

    /// Tear down everything held for a leaving recipient: cancel its
    /// scheduler and purge its queue
    pub fn on_disconnect(&self, recipient: &RecipientId) -> DisconnectSummary {
        let Some(session) = self.sessions().remove(recipient) else {
            // Still purge: a host may have attached entries without a session
            let purged = self.inner.store.purge(recipient, ANNOUNCEMENT_KEY);
            return DisconnectSummary {
                cancelled_driver: false,
                purged,
            };
        };

        let driver = session.disconnect();
        // Purge under the session lock so a scheduler mid-delivery sees a
        // consistent (disconnected, empty) view when it reacquires it
        let purged = {
            let _state = session.lock();
            self.inner.store.purge(recipient, ANNOUNCEMENT_KEY)
        };

        let summary = DisconnectSummary {
            cancelled_driver: driver.is_some(),
            purged,
        };
        debug!(
            recipient = %recipient,
            cancelled_driver = summary.cancelled_driver,
            purged = summary.purged,
            "Recipient disconnected"
        );
        summary
    }

    /// Queue `text` for `recipient` on behalf of `owner`, electing `owner` as
    /// driver when no scheduler is live for that recipient
    pub fn announce(
        &self,
        recipient: &RecipientId,
        owner: &OwnerToken,
        text: impl Into<String>,
    ) -> Result<AnnounceOutcome> {
        let session = self
            .session(recipient)
            .ok_or(HeraldError::NotConnected(*recipient))?;

        let mut state = session.lock();
        if !session.is_connected() {
            return Err(HeraldError::NotConnected(*recipient));
        }

        let store = &self.inner.store;
        let entry = Announcement::new(owner.clone(), text);

        if state.live_driver().is_some() {
            store.add(recipient, ANNOUNCEMENT_KEY, entry);
            let position = store.get(recipient, ANNOUNCEMENT_KEY).len() - 1;
            debug!(recipient = %recipient, owner = %owner, position, "Announcement queued");
            return Ok(AnnounceOutcome::Queued { position });
        }

        if !store.is_empty(recipient, ANNOUNCEMENT_KEY) {
            warn!(recipient = %recipient, owner = %owner, "Adopting announcement queue with no live driver");
        }

        // Start before appending: a failed start leaves the queue untouched, and
        // the new scheduler cannot fire before this lock is released
        let scheduler = RotationScheduler::new(
            session.clone(),
            store.clone(),
            self.inner.channel.clone(),
            self.inner.rotation,
        );
        let handle = scheduler.handle();
        scheduler.start()?;
        store.add(recipient, ANNOUNCEMENT_KEY, entry);
        state.driver = Some(handle.clone());
        debug!(recipient = %recipient, owner = %owner, scheduler = handle.id(), "Elected rotation driver");
        Ok(AnnounceOutcome::Driver(handle))
    }

    pub fn is_connected(&self, recipient: &RecipientId) -> bool {
        self.session(recipient).is_some()
    }

    pub fn connected_count(&self) -> usize {
        self.sessions().len()
    }

    /// The live scheduler for `recipient`, if any
    pub fn driver(&self, recipient: &RecipientId) -> Option<SchedulerHandle> {
        let session = self.session(recipient)?;
        let state = session.lock();
        state.live_driver().cloned()
    }

    /// Number of recipients with a live scheduler
    pub fn active_schedulers(&self) -> usize {
        let sessions: Vec<_> = self.sessions().values().cloned().collect();
        sessions
            .iter()
            .filter(|s| s.lock().live_driver().is_some())
            .count()
    }

    /// Entries still waiting for `recipient`, head first
    pub fn pending(&self, recipient: &RecipientId) -> Vec<Announcement> {
        self.inner.store.get(recipient, ANNOUNCEMENT_KEY)
    }

    /// Disconnect every recipient (host shutdown)
    pub fn shutdown(&self) -> usize {
        let recipients: Vec<_> = self.sessions().keys().copied().collect();
        for recipient in &recipients {
            self.on_disconnect(recipient);
        }
        info!(count = recipients.len(), "Disconnected all recipients");
        recipients.len()
    }
}
