use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use anyhow::{bail, Result};
use ecoenergy_lib::feed::{ChannelFeed, FeedListener, FeedSource, ListenerConfig, ListenerStatus};
use serde_json::{json, Value};
use tokio::{
    sync::mpsc,
    time::{self, Duration},
};

fn config() -> ListenerConfig {
    ListenerConfig {
        inactivity_timeout: Duration::from_secs(5),
        ..ListenerConfig::default()
    }
}

/// Fails the first `failures` subscriptions, then behaves like a `ChannelFeed`.
struct FlakyFeed {
    failures: AtomicU32,
    inner: ChannelFeed,
}

impl FlakyFeed {
    fn new(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            inner: ChannelFeed::new(16),
        }
    }
}

impl FeedSource for FlakyFeed {
    fn subscribe(&self, data_path: &str) -> Result<mpsc::Receiver<Value>> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            bail!("realtime database unavailable");
        }
        self.inner.subscribe(data_path)
    }
}

#[tokio::test(start_paused = true)]
async fn test_quiet_period_finalizes_last_message_exactly_once() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, mut finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();

    let tx = feed.publisher().unwrap();
    tx.send(json!({"weight": 80, "type": "wet"})).await.unwrap();
    time::sleep(Duration::from_secs(1)).await;
    tx.send(json!({"weight": 120, "type": "wet"})).await.unwrap();

    time::sleep(Duration::from_millis(4_900)).await;
    assert!(finalized.try_recv().is_err(), "finalized before the timeout");

    let reading = finalized.recv().await.unwrap();
    assert_eq!(reading.weight, 120.0);
    assert_eq!(reading.waste_type_label, "wet");

    time::sleep(Duration::from_secs(60)).await;
    assert!(finalized.try_recv().is_err(), "finalized more than once");

    let snapshot = listener.snapshot().await;
    assert_eq!(snapshot.status, ListenerStatus::Finalized);
    assert_eq!(snapshot.reading, reading);
}

#[tokio::test(start_paused = true)]
async fn test_steady_stream_never_finalizes() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, mut finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();

    let tx = feed.publisher().unwrap();
    for step in 0..10 {
        tx.send(json!({"weight": step * 10, "type": "dry"})).await.unwrap();
        time::sleep(Duration::from_secs(4)).await;
    }

    assert!(finalized.try_recv().is_err());
    let snapshot = listener.snapshot().await;
    assert_eq!(snapshot.status, ListenerStatus::Streaming);
    assert_eq!(snapshot.message_count, 10);
    assert_eq!(snapshot.reading.weight, 90.0);
}

#[tokio::test(start_paused = true)]
async fn test_frozen_reading_ignores_late_messages() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, mut finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();

    let tx = feed.publisher().unwrap();
    tx.send(json!({"weight": 42, "type": "dry"})).await.unwrap();
    let reading = finalized.recv().await.unwrap();

    tx.send(json!({"weight": 999, "type": "wet"})).await.unwrap();
    time::sleep(Duration::from_secs(10)).await;

    assert!(finalized.try_recv().is_err());
    assert_eq!(listener.snapshot().await.reading, reading);
}

#[tokio::test(start_paused = true)]
async fn test_reset_returns_to_idle_and_streams_again() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, mut finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();

    let tx = feed.publisher().unwrap();

    // Reset mid-stream cancels the pending finalization.
    tx.send(json!({"weight": 10, "type": "wet"})).await.unwrap();
    time::sleep(Duration::from_secs(1)).await;
    listener.reset().await.unwrap();
    let snapshot = listener.snapshot().await;
    assert_eq!(snapshot.status, ListenerStatus::Idle);
    assert_eq!(snapshot.reading.weight, 0.0);
    assert_eq!(snapshot.reading.waste_type_label, "");

    time::sleep(Duration::from_secs(10)).await;
    assert!(finalized.try_recv().is_err());

    // Reset after finalization frees the listener for the next measurement.
    tx.send(json!({"weight": 20, "type": "dry"})).await.unwrap();
    finalized.recv().await.unwrap();
    listener.reset().await.unwrap();
    assert_eq!(listener.snapshot().await.status, ListenerStatus::Idle);

    tx.send(json!({"weight": 30, "type": "dry"})).await.unwrap();
    let next = finalized.recv().await.unwrap();
    assert_eq!(next.weight, 30.0);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_timer_and_reset_resubscribes() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, mut finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();

    let tx = feed.publisher().unwrap();
    tx.send(json!({"weight": 10, "type": "wet"})).await.unwrap();
    drop(tx);
    feed.close();

    time::sleep(Duration::from_secs(10)).await;
    assert!(finalized.try_recv().is_err());
    let snapshot = listener.snapshot().await;
    assert_eq!(snapshot.status, ListenerStatus::Idle);
    assert!(!snapshot.subscribed);
    assert!(!listener.is_running());

    listener.reset().await.unwrap();
    time::sleep(Duration::from_millis(1)).await;
    assert!(listener.is_running());
    assert!(listener.snapshot().await.subscribed);

    let tx = feed.publisher().unwrap();
    tx.send(json!({"weight": 55, "type": "dry"})).await.unwrap();
    assert_eq!(finalized.recv().await.unwrap().weight, 55.0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_releases_subscription_and_timer() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, mut finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();

    let tx = feed.publisher().unwrap();
    tx.send(json!({"weight": 10, "type": "wet"})).await.unwrap();
    time::sleep(Duration::from_secs(1)).await;

    listener.stop().await.unwrap();
    assert!(tx.is_closed());

    time::sleep(Duration::from_secs(10)).await;
    assert!(finalized.try_recv().is_err());
    assert_eq!(listener.snapshot().await.status, ListenerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_rejected() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, _finalized) = FeedListener::new(feed, config());
    listener.start().await.unwrap();
    assert!(listener.start().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_subscription_failure_leaves_listener_idle() {
    let feed = Arc::new(FlakyFeed::new(1));
    let (mut listener, _finalized) = FeedListener::new(feed, config());

    assert!(listener.start().await.is_err());
    assert!(!listener.is_running());
    let snapshot = listener.snapshot().await;
    assert_eq!(snapshot.status, ListenerStatus::Idle);
    assert!(!snapshot.subscribed);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_policy_retries_with_backoff() {
    let feed = Arc::new(FlakyFeed::new(2));
    let (mut listener, mut finalized) = FeedListener::new(
        feed.clone(),
        ListenerConfig {
            reconnect_attempts: 3,
            reconnect_initial_backoff: Duration::from_millis(100),
            reconnect_max_backoff: Duration::from_secs(1),
            ..config()
        },
    );

    listener.start().await.unwrap();
    assert!(!listener.snapshot().await.subscribed);

    time::sleep(Duration::from_secs(1)).await;
    assert!(listener.snapshot().await.subscribed);

    let tx = feed.inner.publisher().unwrap();
    tx.send(json!({"sensor": {"weight": "64", "type": "wet"}}))
        .await
        .unwrap();
    assert_eq!(finalized.recv().await.unwrap().weight, 64.0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_listener_unsubscribes() {
    let feed = Arc::new(ChannelFeed::new(16));
    let (mut listener, _finalized) = FeedListener::new(feed.clone(), config());
    listener.start().await.unwrap();
    let tx = feed.publisher().unwrap();

    drop(listener);
    time::sleep(Duration::from_millis(1)).await;
    assert!(tx.is_closed());
}
