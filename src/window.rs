//! Sliding time-window tag counts.
//!
//! `record` appends to an arrival-ordered log and bumps the tag's count;
//! `expire` pops stale entries off the front and decrements, deleting tags that
//! reach zero. Every count therefore equals the number of unexpired log entries
//! for its tag. Arrival order is assumed to be roughly time order: slightly
//! out-of-order events are tolerated but not re-sorted.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: u64,
    /// Order in which the key first appeared; stable tie-break for `top_n`.
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window: Duration,
    horizon: TimeDelta,
    counts: HashMap<String, Slot>,
    log: VecDeque<(String, DateTime<Utc>)>,
    next_seq: u64,
}

impl SlidingWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            horizon: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            counts: HashMap::new(),
            log: VecDeque::new(),
            next_seq: 0,
        }
    }

    /// Count one occurrence of `tag` at `now`.
    pub fn record(&mut self, tag: &str, now: DateTime<Utc>) {
        match self.counts.get_mut(tag) {
            Some(slot) => slot.count += 1,
            None => {
                self.counts.insert(
                    tag.to_string(),
                    Slot {
                        count: 1,
                        seq: self.next_seq,
                    },
                );
                self.next_seq += 1;
            }
        }
        self.log.push_back((tag.to_string(), now));
    }

    /// Drop every log entry older than the window, relative to `now`.
    /// Returns how many entries were removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        while let Some((_, t)) = self.log.front() {
            if now.signed_duration_since(*t) <= self.horizon {
                break;
            }
            let Some((tag, _)) = self.log.pop_front() else {
                break;
            };
            removed += 1;
            if let Some(slot) = self.counts.get_mut(&tag) {
                slot.count -= 1;
                if slot.count == 0 {
                    self.counts.remove(&tag);
                }
            }
        }
        removed
    }

    /// Current count for `tag` (0 when absent). Call `expire` first for an exact window.
    pub fn count(&self, tag: &str) -> u64 {
        self.counts.get(tag).map(|s| s.count).unwrap_or(0)
    }

    /// Highest counts first; equal counts keep first-seen order.
    pub fn top_n(&self, n: usize) -> Vec<TagCount> {
        let mut rows: Vec<(&String, &Slot)> = self.counts.iter().collect();
        rows.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.1.seq.cmp(&b.1.seq)));
        rows.into_iter()
            .take(n)
            .map(|(tag, slot)| TagCount {
                tag: tag.clone(),
                count: slot.count,
            })
            .collect()
    }

    /// Number of distinct tags inside the window.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Number of log entries inside the window.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
