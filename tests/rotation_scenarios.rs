// tests/rotation_scenarios.rs
// End-to-end rotation behavior through the public API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use herald::{
    AnnounceOutcome, Delivery, DeliveryChannel, DisplayMode, ForwardingChannel, InMemoryAttachmentStore,
    OwnerToken, RecipientId, RecipientTracker, RotationConfig, SchedulerState,
};
use tokio::sync::{Barrier, mpsc};
use tokio::time;

fn setup() -> (RecipientTracker, mpsc::UnboundedReceiver<Delivery>) {
    let (channel, rx) = ForwardingChannel::new();
    let tracker = RecipientTracker::new(
        Arc::new(InMemoryAttachmentStore::new()),
        Arc::new(channel),
        RotationConfig::default(),
    );
    (tracker, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Delivery>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(d) = rx.try_recv() {
        texts.push(d.text);
    }
    texts
}

#[tokio::test(start_paused = true)]
async fn two_producers_rotate_in_order_then_stop() {
    let (tracker, mut rx) = setup();
    let r = RecipientId::new();
    tracker.on_connect(r);

    let a = tracker.announce(&r, &OwnerToken::new("A"), "A").unwrap();
    let b = tracker.announce(&r, &OwnerToken::new("B"), "B").unwrap();
    let AnnounceOutcome::Driver(handle) = a else {
        panic!("A saw an empty queue and should drive");
    };
    assert_eq!(b, AnnounceOutcome::Queued { position: 1 });

    // First tick: "A" shown and removed, "B" still waiting
    time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(drain(&mut rx), vec!["A"]);
    assert_eq!(handle.state(), SchedulerState::Running);
    let pending = tracker.pending(&r);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].text, "B");

    // Second tick: "B" shown, queue empty, scheduler gone
    time::sleep(Duration::from_secs(3)).await;
    assert_eq!(drain(&mut rx), vec!["B"]);
    assert_eq!(handle.state(), SchedulerState::Cancelled);
    assert!(tracker.driver(&r).is_none());
    assert!(tracker.pending(&r).is_empty());

    // Nothing more ever fires
    time::sleep(Duration::from_secs(30)).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn delivery_is_fifo_across_many_producers() {
    let (tracker, mut rx) = setup();
    let r = RecipientId::new();
    tracker.on_connect(r);

    let expected: Vec<String> = (0..6).map(|i| format!("message {i}")).collect();
    let mut drivers = 0;
    for (i, text) in expected.iter().enumerate() {
        let outcome = tracker
            .announce(&r, &OwnerToken::new(format!("producer-{i}")), text.clone())
            .unwrap();
        if outcome.is_driver() {
            drivers += 1;
        }
    }
    assert_eq!(drivers, 1);

    time::sleep(Duration::from_secs(1 + 3 * 6)).await;
    assert_eq!(drain(&mut rx), expected);
    assert_eq!(tracker.active_schedulers(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_announcement_joins_running_rotation() {
    let (tracker, mut rx) = setup();
    let r = RecipientId::new();
    tracker.on_connect(r);

    tracker.announce(&r, &OwnerToken::new("A"), "A").unwrap();
    tracker.announce(&r, &OwnerToken::new("B"), "B").unwrap();
    time::sleep(Duration::from_millis(1100)).await;

    // Scheduler still live; C queues behind B instead of starting a second driver
    let c = tracker.announce(&r, &OwnerToken::new("C"), "C").unwrap();
    assert_eq!(c, AnnounceOutcome::Queued { position: 1 });
    assert_eq!(tracker.active_schedulers(), 1);

    time::sleep(Duration::from_secs(6)).await;
    assert_eq!(drain(&mut rx), vec!["A", "B", "C"]);
    assert!(tracker.driver(&r).is_none());
}

#[tokio::test(start_paused = true)]
async fn disconnect_between_ticks_purges_and_cancels() {
    let (tracker, mut rx) = setup();
    let r = RecipientId::new();
    tracker.on_connect(r);

    let AnnounceOutcome::Driver(handle) = tracker.announce(&r, &OwnerToken::new("A"), "A").unwrap() else {
        panic!("expected driver");
    };
    tracker.announce(&r, &OwnerToken::new("B"), "B").unwrap();

    time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(drain(&mut rx), vec!["A"]);

    let summary = tracker.on_disconnect(&r);
    assert!(summary.cancelled_driver);
    assert_eq!(summary.purged, 1);
    assert_eq!(handle.state(), SchedulerState::Cancelled);
    assert!(tracker.pending(&r).is_empty());
    assert!(tracker.driver(&r).is_none());

    time::sleep(Duration::from_secs(30)).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn disconnect_in_any_state_leaves_nothing() {
    let (tracker, _rx) = setup();

    // Never announced
    let idle = RecipientId::new();
    tracker.on_connect(idle);
    assert_eq!(tracker.on_disconnect(&idle).purged, 0);

    // Already drained
    let drained = RecipientId::new();
    tracker.on_connect(drained);
    let AnnounceOutcome::Driver(handle) = tracker.announce(&drained, &OwnerToken::new("A"), "A").unwrap() else {
        panic!("expected driver");
    };
    handle.cancelled().await;
    let summary = tracker.on_disconnect(&drained);
    assert!(!summary.cancelled_driver);
    assert_eq!(summary.purged, 0);

    for r in [idle, drained] {
        assert!(tracker.pending(&r).is_empty());
        assert!(tracker.driver(&r).is_none());
    }
    assert_eq!(tracker.active_schedulers(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_twice_has_no_effect() {
    let (tracker, mut rx) = setup();
    let r = RecipientId::new();
    tracker.on_connect(r);
    let AnnounceOutcome::Driver(handle) = tracker.announce(&r, &OwnerToken::new("A"), "A").unwrap() else {
        panic!("expected driver");
    };

    handle.cancel();
    handle.cancel();
    tracker.on_disconnect(&r);
    handle.cancel();

    assert_eq!(handle.state(), SchedulerState::Cancelled);
    time::sleep(Duration::from_secs(10)).await;
    assert!(drain(&mut rx).is_empty());
}

/// Transport that takes half a second per delivery
struct SlowChannel(ForwardingChannel);

#[async_trait]
impl DeliveryChannel for SlowChannel {
    async fn send(&self, recipient: &RecipientId, text: &str, mode: DisplayMode) -> herald::Result<()> {
        time::sleep(Duration::from_millis(500)).await;
        self.0.send(recipient, text, mode).await
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_delivery_shows_head_exactly_once() {
    let (channel, mut rx) = ForwardingChannel::new();
    let tracker = RecipientTracker::new(
        Arc::new(InMemoryAttachmentStore::new()),
        Arc::new(SlowChannel(channel)),
        RotationConfig::default(),
    );
    let r = RecipientId::new();
    tracker.on_connect(r);

    let AnnounceOutcome::Driver(handle) = tracker.announce(&r, &OwnerToken::new("A"), "A").unwrap() else {
        panic!("expected driver");
    };
    tracker.announce(&r, &OwnerToken::new("B"), "B").unwrap();

    // "A" is on the wire from 1s to 1.5s
    time::sleep(Duration::from_millis(1100)).await;
    handle.cancel();
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(drain(&mut rx), vec!["A"]);
    assert!(tracker.pending(&r).is_empty());
    assert!(tracker.driver(&r).is_none());

    assert!(tracker.announce(&r, &OwnerToken::new("C"), "C").unwrap().is_driver());
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(drain(&mut rx), vec!["C"]);
}

#[tokio::test(start_paused = true)]
async fn driver_elected_during_slow_delivery_waits_its_turn() {
    let (channel, mut rx) = ForwardingChannel::new();
    let tracker = RecipientTracker::new(
        Arc::new(InMemoryAttachmentStore::new()),
        Arc::new(SlowChannel(channel)),
        RotationConfig {
            initial_delay: Duration::from_millis(100),
            ..RotationConfig::default()
        },
    );
    let r = RecipientId::new();
    tracker.on_connect(r);

    let AnnounceOutcome::Driver(old) = tracker.announce(&r, &OwnerToken::new("A"), "A").unwrap() else {
        panic!("expected driver");
    };
    tracker.announce(&r, &OwnerToken::new("B"), "B").unwrap();

    // Old driver is mid-send of "A"; the successor fires while it is still on the wire
    time::sleep(Duration::from_millis(150)).await;
    old.cancel();
    assert!(tracker.announce(&r, &OwnerToken::new("C"), "C").unwrap().is_driver());

    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(drain(&mut rx), vec!["A", "B", "C"]);
    assert!(tracker.pending(&r).is_empty());
    assert_eq!(tracker.active_schedulers(), 0);
}

#[tokio::test(start_paused = true)]
async fn recipients_rotate_independently() {
    let (tracker, mut rx) = setup();
    let r1 = RecipientId::new();
    let r2 = RecipientId::new();
    tracker.on_connect(r1);
    tracker.on_connect(r2);

    let owner = OwnerToken::new("A");
    assert!(tracker.announce(&r1, &owner, "for r1").unwrap().is_driver());
    assert!(tracker.announce(&r2, &owner, "for r2").unwrap().is_driver());
    assert_eq!(tracker.active_schedulers(), 2);

    tracker.on_disconnect(&r1);
    time::sleep(Duration::from_millis(1100)).await;

    let deliveries: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].recipient, r2);
    assert_eq!(deliveries[0].text, "for r2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_elect_exactly_one_driver() {
    let (tracker, _rx) = setup();
    let r = RecipientId::new();
    tracker.on_connect(r);

    let producers = 16;
    let barrier = Arc::new(Barrier::new(producers));
    let mut tasks = Vec::new();
    for i in 0..producers {
        let tracker = tracker.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            tracker
                .announce(&r, &OwnerToken::new(format!("p{i}")), format!("m{i}"))
                .unwrap()
        }));
    }

    let mut drivers = 0;
    for task in tasks {
        if task.await.unwrap().is_driver() {
            drivers += 1;
        }
    }

    assert_eq!(drivers, 1);
    assert_eq!(tracker.active_schedulers(), 1);
    assert_eq!(tracker.pending(&r).len(), producers);
    tracker.on_disconnect(&r);
}
