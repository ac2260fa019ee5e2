//! # Rolling Buckets
//! Fixed-length per-tag history of counts, one bucket per timer tick.
//!
//! Every tracked tag owns a history deque that is index-aligned with a shared
//! label deque. `tick` seals the in-progress accumulators into a new bucket and
//! evicts the oldest bucket of every series in lockstep once the cap is exceeded.

use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
struct TagSeries {
    tag: String,
    history: VecDeque<u64>,
    /// Matches seen during the bucket still in progress.
    current: u64,
}

#[derive(Debug, Clone)]
pub struct RollingBuckets {
    cap: usize,
    labels: VecDeque<String>,
    series: Vec<TagSeries>,
}

impl RollingBuckets {
    /// `cap` is clamped to at least one bucket.
    pub fn with_cap(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            labels: VecDeque::with_capacity(cap + 1),
            series: Vec::new(),
        }
    }

    /// Register a tag. Its history is zero-filled up to the current label count
    /// so all sequences stay aligned. Returns false if already tracked.
    pub fn track(&mut self, tag: &str) -> bool {
        if self.position(tag).is_some() {
            return false;
        }
        self.series.push(TagSeries {
            tag: tag.to_string(),
            history: std::iter::repeat(0).take(self.labels.len()).collect(),
            current: 0,
        });
        true
    }

    /// Drop a tag and its history. Returns false if it was not tracked.
    pub fn untrack(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Some(i) => {
                self.series.remove(i);
                true
            }
            None => false,
        }
    }

    /// Count one match for `tag` in the current bucket. Untracked tags are ignored.
    pub fn record(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Some(i) => {
                self.series[i].current += 1;
                true
            }
            None => false,
        }
    }

    /// Seal the current bucket under `label` and start a fresh one.
    pub fn tick(&mut self, label: impl Into<String>) {
        self.labels.push_back(label.into());
        for s in &mut self.series {
            s.history.push_back(s.current);
            s.current = 0;
        }

        while self.labels.len() > self.cap {
            self.labels.pop_front();
            for s in &mut self.series {
                s.history.pop_front();
            }
        }
    }

    pub fn labels(&self) -> &VecDeque<String> {
        &self.labels
    }

    pub fn history(&self, tag: &str) -> Option<&VecDeque<u64>> {
        self.position(tag).map(|i| &self.series[i].history)
    }

    /// Accumulator of the bucket still in progress.
    pub fn pending(&self, tag: &str) -> Option<u64> {
        self.position(tag).map(|i| self.series[i].current)
    }

    /// `(tag, history)` pairs in tracking order.
    pub fn series(&self) -> impl Iterator<Item = (&str, &VecDeque<u64>)> {
        self.series.iter().map(|s| (s.tag.as_str(), &s.history))
    }

    /// Sum of the sealed buckets still held for `tag`.
    pub fn sealed_total(&self, tag: &str) -> u64 {
        self.history(tag).map(|h| h.iter().sum()).unwrap_or(0)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    fn position(&self, tag: &str) -> Option<usize> {
        self.series.iter().position(|s| s.tag == tag)
    }
}

/// Bucket width over the life of a session: narrow at first, wider later.
#[derive(Debug, Clone, Copy)]
pub struct IntervalSchedule {
    pub initial: Duration,
    pub widened: Duration,
    pub widen_after: Duration,
}

impl IntervalSchedule {
    /// Width to use for the next bucket, given time elapsed since session start.
    pub fn width_at(&self, elapsed: Duration) -> Duration {
        if elapsed >= self.widen_after {
            self.widened
        } else {
            self.initial
        }
    }
}
