// src/scheduler.rs
// Rotation scheduler: drains one recipient's announcement queue on a fixed cadence
//
// Idle -> Running on start, Running -> Cancelled when the queue drains, the
// recipient disconnects, or the handle is cancelled. Cancelled is terminal.
// A scheduler cancelled while its recipient stays connected purges whatever
// it leaves behind unless a successor has already been elected.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::announcement::ANNOUNCEMENT_KEY;
use crate::config::RotationConfig;
use crate::delivery::DeliveryChannel;
use crate::error::{HeraldError, Result};
use crate::recipient::RecipientId;
use crate::store::AttachmentStore;
use crate::tracker::Session;

static NEXT_SCHEDULER_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a rotation scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Cancelled,
}

/// Cancellable reference to one recipient's live scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    id: u64,
    recipient: RecipientId,
    token: CancellationToken,
    state: Arc<watch::Sender<SchedulerState>>,
}

impl SchedulerHandle {
    fn new(recipient: RecipientId) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            id: NEXT_SCHEDULER_ID.fetch_add(1, Ordering::Relaxed),
            recipient,
            token: CancellationToken::new(),
            state: Arc::new(state),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn recipient(&self) -> RecipientId {
        self.recipient
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Stop the scheduler. Idempotent: cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
        self.state.send_if_modified(|state| {
            if *state == SchedulerState::Cancelled {
                false
            } else {
                *state = SchedulerState::Cancelled;
                true
            }
        });
    }

    /// Wait until the scheduler reaches `Cancelled`
    pub async fn cancelled(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as this handle, so wait_for cannot fail
        let _ = rx.wait_for(|state| *state == SchedulerState::Cancelled).await;
    }

    fn mark_running(&self) {
        self.state.send_if_modified(|state| {
            if *state == SchedulerState::Idle {
                *state = SchedulerState::Running;
                true
            } else {
                false
            }
        });
    }
}

impl PartialEq for SchedulerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SchedulerHandle {}

/// What a single firing did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Head entry shown and removed; `remaining` entries still queued
    Delivered { remaining: usize },
    /// Queue is empty; the scheduler has deregistered itself
    Drained,
    /// An earlier scheduler is still delivering; try again next period
    Deferred,
    /// Recipient left or the handle was cancelled
    Stale,
}

impl TickOutcome {
    fn keeps_running(&self) -> bool {
        match self {
            Self::Delivered { remaining } => *remaining > 0,
            Self::Deferred => true,
            Self::Drained | Self::Stale => false,
        }
    }
}

/// Periodic drainer for one recipient's announcement queue
pub struct RotationScheduler {
    handle: SchedulerHandle,
    session: Arc<Session>,
    store: Arc<dyn AttachmentStore>,
    channel: Arc<dyn DeliveryChannel>,
    rotation: RotationConfig,
}

impl RotationScheduler {
    pub(crate) fn new(
        session: Arc<Session>,
        store: Arc<dyn AttachmentStore>,
        channel: Arc<dyn DeliveryChannel>,
        rotation: RotationConfig,
    ) -> Self {
        Self {
            handle: SchedulerHandle::new(session.recipient()),
            session,
            store,
            channel,
            rotation,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Move to `Running` and spawn the firing loop on the current runtime
    pub(crate) fn start(self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| HeraldError::Other(format!("no async runtime to drive rotation: {e}")))?;
        self.handle.mark_running();
        debug!(
            recipient = %self.handle.recipient,
            scheduler = self.handle.id,
            "Rotation scheduler started"
        );
        runtime.spawn(self.run());
        Ok(())
    }

    async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.rotation.initial_delay, self.rotation.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.handle.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = self.tick().await;
            if !outcome.keeps_running() {
                debug!(
                    recipient = %self.handle.recipient,
                    scheduler = self.handle.id,
                    ?outcome,
                    "Rotation scheduler stopping"
                );
                break;
            }
        }

        self.finish();
    }

    /// One firing: show the head entry, then remove exactly that entry
    pub(crate) async fn tick(&self) -> TickOutcome {
        let recipient = self.handle.recipient;

        let head = {
            let mut state = self.session.lock();
            if self.handle.is_cancelled() || !self.session.is_connected() {
                return TickOutcome::Stale;
            }
            if state.in_flight {
                return TickOutcome::Deferred;
            }
            match self.store.first(&recipient, ANNOUNCEMENT_KEY) {
                Some(head) => {
                    state.in_flight = true;
                    head
                }
                None => {
                    state.release(&self.handle);
                    return TickOutcome::Drained;
                }
            }
        };

        // Lock released while the transport does its thing; producers may append meanwhile
        if let Err(e) = self
            .channel
            .send(&recipient, &head.text, self.rotation.display)
            .await
        {
            warn!(recipient = %recipient, owner = %head.owner, error = %e, "Announcement delivery failed");
        } else {
            debug!(
                recipient = %recipient,
                owner = %head.owner,
                waited_ms = head.age().num_milliseconds(),
                "Announcement delivered"
            );
        }

        let mut state = self.session.lock();
        state.in_flight = false;
        if !self.session.is_connected() {
            // Disconnect already purged the queue
            return TickOutcome::Stale;
        }
        // The head was shown; consume it even if the handle was cancelled meanwhile
        self.store.remove(&recipient, ANNOUNCEMENT_KEY, &head.owner);
        if self.handle.is_cancelled() {
            return TickOutcome::Stale;
        }
        let remaining = self.store.get(&recipient, ANNOUNCEMENT_KEY).len();
        if remaining == 0 {
            state.release(&self.handle);
            return TickOutcome::Drained;
        }
        TickOutcome::Delivered { remaining }
    }

    fn finish(&self) {
        let recipient = self.handle.recipient;
        let mut state = self.session.lock();
        state.release(&self.handle);
        self.handle.cancel();

        // Leftovers with nobody to drain them would sit until some unrelated announce
        if self.session.is_connected() && state.live_driver().is_none() {
            let purged = self.store.purge(&recipient, ANNOUNCEMENT_KEY);
            if purged > 0 {
                debug!(
                    recipient = %recipient,
                    scheduler = self.handle.id,
                    purged,
                    "Purged announcements left by cancelled scheduler"
                );
            }
        }
    }
}
