// tests/runtime_loop.rs
//
// Controller task behaviour with feeds the test controls:
// - a feed whose connect never finishes must not hold up commands or ticks
// - unmatched posts publish no snapshot
// - the real timer drives buckets, caps the history and widens after 2 min
// - the task ends once every handle is gone

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use skypulse::blocklist::Blocklist;
use skypulse::clock::{Clock, ManualClock, SystemClock};
use skypulse::config::AggregationParams;
use skypulse::feed::{Event, FeedSource};
use skypulse::filter::MatchPolicy;
use skypulse::runtime;
use skypulse::snapshot::FeedStatus;
use skypulse::Controller;

/// Connect that never completes, like a blackholed endpoint.
struct StalledFeed;

#[async_trait]
impl FeedSource for StalledFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<Event>> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

/// Hands out a receiver whose sender the test keeps.
struct ChannelFeed {
    rx: Mutex<Option<mpsc::Receiver<Event>>>,
}

impl ChannelFeed {
    fn new() -> (Arc<Self>, mpsc::Sender<Event>) {
        let (tx, rx) = mpsc::channel(16);
        let feed = Arc::new(Self {
            rx: Mutex::new(Some(rx)),
        });
        (feed, tx)
    }
}

#[async_trait]
impl FeedSource for ChannelFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<Event>> {
        self.rx
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("already subscribed"))
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

fn controller(clock: Arc<dyn Clock>) -> Controller {
    Controller::new(
        MatchPolicy::Tokenized,
        Blocklist::empty(),
        clock,
        AggregationParams::default(),
    )
}

fn post(text: &str) -> Event {
    Event {
        text: text.to_string(),
        created_at: None,
        observed_at: Utc::now(),
    }
}

/// Yield until the controller has taken every queued event off the channel.
/// On the current-thread runtime that also means it finished handling them.
async fn drained(tx: &mpsc::Sender<Event>) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while tx.capacity() < tx.max_capacity() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("controller should drain the feed");
    tokio::task::yield_now().await;
}

#[tokio::test]
async fn commands_are_answered_while_feed_connect_hangs() {
    let (handle, _task) = runtime::spawn(controller(Arc::new(SystemClock)), Arc::new(StalledFeed));

    let terms = tokio::time::timeout(Duration::from_secs(2), handle.add_term("rust".into()))
        .await
        .expect("first add must not wait on the feed")
        .unwrap();
    assert_eq!(terms, vec!["rust"]);

    let terms = tokio::time::timeout(Duration::from_secs(2), handle.add_term("go".into()))
        .await
        .expect("second add must not wait on the feed")
        .unwrap();
    assert_eq!(terms, vec!["rust", "go"]);

    let snap = handle.snapshot();
    assert_eq!(snap.terms, vec!["rust", "go"]);
    assert_eq!(snap.feed, FeedStatus::Connecting);
}

#[tokio::test(start_paused = true)]
async fn ticks_keep_firing_while_feed_connect_hangs() {
    let clock = ManualClock::at_millis(0);
    let (handle, _task) = runtime::spawn(controller(Arc::new(clock.clone())), Arc::new(StalledFeed));
    handle.add_term("rust".into()).await.unwrap();

    let mut rx = handle.watch();
    rx.borrow_and_update();
    clock.advance(Duration::from_secs(5));
    tokio::time::advance(Duration::from_secs(5)).await;
    rx.changed().await.unwrap();

    let snap = rx.borrow_and_update().clone();
    assert_eq!(snap.rolling.labels, vec!["00:00:05"]);
    assert_eq!(snap.feed, FeedStatus::Connecting);
}

#[tokio::test(start_paused = true)]
async fn unmatched_posts_publish_nothing() {
    let (feed, tx) = ChannelFeed::new();
    let (handle, _task) = runtime::spawn(controller(Arc::new(SystemClock)), feed);
    handle.add_term("rust".into()).await.unwrap();

    let mut rx = handle.watch();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.feed == FeedStatus::Live))
        .await
        .expect("feed should go live")
        .unwrap();
    rx.borrow_and_update();

    for i in 0..10 {
        tx.send(post(&format!("nothing to see {i} #meh"))).await.unwrap();
    }
    drained(&tx).await;
    assert!(!rx.has_changed().unwrap());
    assert!(handle.snapshot().top_hashtags.is_empty());

    tx.send(post("rust is fun #rustlang")).await.unwrap();
    drained(&tx).await;
    assert!(rx.has_changed().unwrap());
    let snap = rx.borrow_and_update().clone();
    assert_eq!(snap.messages.len(), 1);
    assert_eq!(snap.top_hashtags[0].tag, "#rustlang");
}

#[tokio::test(start_paused = true)]
async fn timer_seals_buckets_caps_history_and_widens() {
    let clock = ManualClock::at_millis(0);
    let (handle, _task) = runtime::spawn(controller(Arc::new(clock.clone())), Arc::new(StalledFeed));
    handle.add_term("rust".into()).await.unwrap();

    let mut rx = handle.watch();
    rx.borrow_and_update();
    assert_eq!(rx.borrow().bucket_width_secs, 5);

    let mut elapsed = 0;
    let mut seen = Vec::new();
    while elapsed < 120 {
        elapsed += 5;
        clock.advance(Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(5)).await;
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.rolling.labels.len(), (elapsed / 5).min(20) as usize);
        assert_eq!(snap.rolling.datasets[0].data.len(), snap.rolling.labels.len());
        seen.push(snap.bucket_width_secs);
    }
    // widening happens on the tick that reaches two minutes
    assert!(seen[..seen.len() - 1].iter().all(|w| *w == 5));
    assert_eq!(seen.last(), Some(&60));

    let snap = rx.borrow().clone();
    assert_eq!(snap.rolling.labels.len(), 20);
    assert_eq!(snap.rolling.labels.first().map(String::as_str), Some("00:00:25"));
    assert_eq!(snap.rolling.labels.last().map(String::as_str), Some("00:02:00"));

    // next bucket only after the widened width
    clock.advance(Duration::from_secs(5));
    tokio::time::advance(Duration::from_secs(5)).await;
    tokio::task::yield_now().await;
    assert!(!rx.has_changed().unwrap());

    clock.advance(Duration::from_secs(55));
    tokio::time::advance(Duration::from_secs(55)).await;
    rx.changed().await.unwrap();
    let snap = rx.borrow_and_update().clone();
    assert_eq!(snap.rolling.labels.len(), 20);
    assert_eq!(snap.rolling.labels.last().map(String::as_str), Some("00:03:00"));
    assert_eq!(snap.bucket_width_secs, 60);
}

#[tokio::test]
async fn task_ends_when_handles_are_dropped() {
    let (handle, task) = runtime::spawn(controller(Arc::new(SystemClock)), Arc::new(StalledFeed));
    handle.add_term("rust".into()).await.unwrap();
    drop(handle);
    tokio::time::timeout(Duration::from_secs(2), runtime::supervise(task))
        .await
        .expect("controller should stop once no handle is left");
}
