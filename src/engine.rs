// src/engine.rs
//! Aggregation state and the controller that owns it.
//!
//! The controller is the only writer: feed events, timer ticks and user
//! commands all go through `&mut Controller`, one at a time.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::blocklist::Blocklist;
use crate::chat::{ChatLog, ChatMessage};
use crate::clock::{bucket_label, Clock};
use crate::config::AggregationParams;
use crate::feed::Event;
use crate::filter::{extract_hashtags, highlight_segments, MatchPolicy};
use crate::letters::LetterFrequency;
use crate::rolling::{IntervalSchedule, RollingBuckets};
use crate::snapshot::{self, FeedStatus, Snapshot};
use crate::terms::{TermError, TrackedTerms};
use crate::window::SlidingWindow;

/// Every running statistic of a session.
#[derive(Debug, Clone)]
pub struct AggregationState {
    pub terms: TrackedTerms,
    pub letters: LetterFrequency,
    pub rolling: RollingBuckets,
    pub window: SlidingWindow,
    pub chat: ChatLog,
}

impl AggregationState {
    pub fn new(params: &AggregationParams) -> Self {
        Self {
            terms: TrackedTerms::new(),
            letters: LetterFrequency::new(),
            rolling: RollingBuckets::with_cap(params.history_cap),
            window: SlidingWindow::new(params.window),
            chat: ChatLog::with_cap(params.chat_cap),
        }
    }
}

/// What happened to one feed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No tracked term matched; nothing was touched.
    Dropped,
    Matched {
        terms: Vec<String>,
        letters: Vec<char>,
        hashtags: Vec<String>,
    },
}

pub struct Controller {
    state: AggregationState,
    policy: MatchPolicy,
    blocklist: Blocklist,
    clock: Arc<dyn Clock>,
    schedule: IntervalSchedule,
    top_n: usize,
    session_start: DateTime<Utc>,
    bucket_width: Duration,
    started: bool,
    feed: FeedStatus,
}

impl Controller {
    pub fn new(
        policy: MatchPolicy,
        blocklist: Blocklist,
        clock: Arc<dyn Clock>,
        params: AggregationParams,
    ) -> Self {
        let schedule = IntervalSchedule {
            initial: params.initial_bucket,
            widened: params.widened_bucket,
            widen_after: params.widen_after,
        };
        let session_start = clock.now();
        Self {
            state: AggregationState::new(&params),
            policy,
            blocklist,
            clock,
            schedule,
            top_n: params.top_n,
            session_start,
            bucket_width: schedule.initial,
            started: false,
            feed: FeedStatus::Idle,
        }
    }

    /// Run one event through the filter stage and, if it matches, every aggregator.
    pub fn handle_event(&mut self, ev: Event) -> Outcome {
        let matched = self.policy.matches(&ev.text, &self.state.terms);
        if matched.is_empty() {
            counter!("events_unmatched_total").increment(1);
            return Outcome::Dropped;
        }
        counter!("events_matched_total").increment(1);

        let letters = self.state.letters.observe(&ev.text);
        for term in &matched {
            self.state.rolling.record(term);
        }

        let hashtags = extract_hashtags(&ev.text, &self.blocklist);
        for tag in &hashtags {
            self.state.window.record(tag, ev.observed_at);
        }
        if !hashtags.is_empty() {
            counter!("hashtags_recorded_total").increment(hashtags.len() as u64);
        }
        self.state.window.expire(ev.observed_at);
        gauge!("window_distinct_tags").set(self.state.window.distinct() as f64);

        let segments = highlight_segments(&ev.text, &self.state.terms);
        self.state.chat.push(ChatMessage {
            text: ev.text,
            created_at: ev.created_at,
            matched: matched.clone(),
            segments,
        });

        debug!(target: "controller", terms = ?matched, hashtags = ?hashtags, "event matched");
        Outcome::Matched {
            terms: matched,
            letters,
            hashtags,
        }
    }

    /// Seal the current bucket. Returns the width to wait before the next tick.
    pub fn tick(&mut self) -> Duration {
        let now = self.clock.now();
        self.state.rolling.tick(bucket_label(now));
        counter!("rolling_ticks_total").increment(1);

        let elapsed = now
            .signed_duration_since(self.session_start)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let width = self.schedule.width_at(elapsed);
        if width != self.bucket_width {
            info!(
                target: "controller",
                from_secs = self.bucket_width.as_secs(),
                to_secs = width.as_secs(),
                "bucket width changed"
            );
            self.bucket_width = width;
        }
        gauge!("rolling_bucket_width_secs").set(width.as_secs_f64());
        width
    }

    /// Width of the bucket currently being filled.
    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    /// Track one term (incremental variant). Idempotent.
    pub fn add_term(&mut self, raw: &str) -> Result<bool, TermError> {
        let (term, inserted) = self.state.terms.add(raw)?;
        if inserted {
            self.state.rolling.track(&term);
            info!(target: "controller", %term, "tracking term");
        }
        Ok(inserted)
    }

    pub fn remove_term(&mut self, raw: &str) -> bool {
        let term = crate::terms::normalize_term(raw);
        let removed = self.state.terms.remove(&term);
        if removed {
            self.state.rolling.untrack(&term);
            info!(target: "controller", %term, "stopped tracking term");
        }
        removed
    }

    /// Batch variant: track every comma-separated term at once. Allowed once per session.
    pub fn start(&mut self, input: &str) -> Result<Vec<String>, TermError> {
        if self.started {
            return Err(TermError::AlreadyStarted);
        }
        let added = self.state.terms.add_batch(input)?;
        for term in &added {
            self.state.rolling.track(term);
        }
        self.started = true;
        info!(target: "controller", terms = ?added, "tracking started");
        Ok(added)
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn mark_feed_connecting(&mut self) {
        self.feed = FeedStatus::Connecting;
    }

    pub fn mark_feed_live(&mut self) {
        self.feed = FeedStatus::Live;
    }

    /// The feed ended; aggregation stalls until the process restarts.
    pub fn mark_feed_closed(&mut self) {
        self.feed = FeedStatus::Closed;
    }

    pub fn feed_status(&self) -> FeedStatus {
        self.feed
    }

    pub fn terms(&self) -> &TrackedTerms {
        &self.state.terms
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    /// Expire the window against the clock, then project.
    pub fn snapshot(&mut self) -> Snapshot {
        self.state.window.expire(self.clock.now());
        snapshot::project(
            &self.state,
            self.top_n,
            snapshot::Meta {
                feed: self.feed,
                started: self.started,
                policy: self.policy,
                bucket_width: self.bucket_width,
            },
        )
    }
}
