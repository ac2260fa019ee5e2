// src/snapshot.rs
//! Read-only projection of the aggregation state into chart-ready shapes.
//! No aggregation happens here.

use serde::Serialize;
use std::time::Duration;

use crate::chat::ChatMessage;
use crate::engine::AggregationState;
use crate::filter::MatchPolicy;
use crate::letters::letter_labels;
use crate::window::TagCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    /// Not subscribed yet (no term tracked).
    #[default]
    Idle,
    /// Subscription requested, connection not established yet.
    Connecting,
    Live,
    /// Connection ended; no further updates will arrive.
    Closed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LetterSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u64>,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RollingSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// One donut slice. `percent` is `None` while no tag has any sealed count,
/// which the renderer shows as "no data".
#[derive(Debug, Clone, Serialize)]
pub struct ShareSlice {
    pub label: String,
    pub total: u64,
    pub percent: Option<f64>,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub feed: FeedStatus,
    pub started: bool,
    pub policy: MatchPolicy,
    pub terms: Vec<String>,
    pub letters: LetterSeries,
    pub rolling: RollingSeries,
    pub share: Vec<ShareSlice>,
    pub top_hashtags: Vec<TagCount>,
    pub messages: Vec<ChatMessage>,
    pub bucket_width_secs: u64,
    pub window_secs: u64,
}

/// Controller-level facts that are not part of the aggregation state.
#[derive(Debug, Clone, Copy)]
pub struct Meta {
    pub feed: FeedStatus,
    pub started: bool,
    pub policy: MatchPolicy,
    pub bucket_width: Duration,
}

/// Per-series colour, spaced 60° apart on the hue wheel.
pub fn series_color(index: usize) -> String {
    format!("hsl({}, 100%, 50%)", (index * 60) % 360)
}

/// Split `totals` into percentages rounded to two decimals.
/// A zero sum yields `None` for every slice.
pub fn percentages(totals: &[u64]) -> Vec<Option<f64>> {
    let sum: u64 = totals.iter().sum();
    totals
        .iter()
        .map(|&t| {
            if sum == 0 {
                None
            } else {
                Some((t as f64 / sum as f64 * 10_000.0).round() / 100.0)
            }
        })
        .collect()
}

/// Project the state. Callers expire the sliding window first.
pub fn project(state: &AggregationState, top_n: usize, meta: Meta) -> Snapshot {
    let letters = LetterSeries {
        labels: letter_labels(),
        values: state.letters.values().to_vec(),
    };

    let datasets: Vec<Dataset> = state
        .rolling
        .series()
        .enumerate()
        .map(|(i, (tag, hist))| Dataset {
            label: tag.to_string(),
            data: hist.iter().copied().collect(),
            color: series_color(i),
        })
        .collect();

    let totals: Vec<u64> = datasets.iter().map(|d| d.data.iter().sum()).collect();
    let share = datasets
        .iter()
        .zip(totals.iter())
        .zip(percentages(&totals))
        .map(|((d, &total), percent)| ShareSlice {
            label: d.label.clone(),
            total,
            percent,
            color: d.color.clone(),
        })
        .collect();

    Snapshot {
        feed: meta.feed,
        started: meta.started,
        policy: meta.policy,
        terms: state.terms.as_slice().to_vec(),
        letters,
        rolling: RollingSeries {
            labels: state.rolling.labels().iter().cloned().collect(),
            datasets,
        },
        share,
        top_hashtags: state.window.top_n(top_n),
        messages: state.chat.iter().cloned().collect(),
        bucket_width_secs: meta.bucket_width.as_secs(),
        window_secs: state.window.window().as_secs(),
    }
}
