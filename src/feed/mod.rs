// src/feed/mod.rs
//! Feed sources: anything that pushes post events into a channel.

pub mod jetstream;
pub mod replay;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

pub use jetstream::JetstreamFeed;
pub use replay::ReplayFeed;

/// Channel depth between a feed task and the controller.
pub const FEED_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub text: String,
    /// `commit.record.createdAt`, kept verbatim for display.
    pub created_at: Option<String>,
    /// When the frame arrived locally; drives window bookkeeping.
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no commit.record.text")]
    MissingText,
    #[error("post text is empty")]
    EmptyText,
}

#[derive(Debug, Deserialize)]
struct Frame {
    commit: Option<Commit>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    record: Option<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    text: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
}

/// Decode one Jetstream text frame into an `Event`.
///
/// Identity/account frames and deletes carry no record, so `MissingText`
/// is the common case on the live firehose, not an anomaly.
pub fn parse_frame(raw: &str, observed_at: DateTime<Utc>) -> Result<Event, FrameError> {
    let frame: Frame = serde_json::from_str(raw)?;
    let record = frame
        .commit
        .and_then(|c| c.record)
        .ok_or(FrameError::MissingText)?;
    let text = record.text.ok_or(FrameError::MissingText)?;
    if text.is_empty() {
        return Err(FrameError::EmptyText);
    }
    Ok(Event {
        text,
        created_at: record.created_at,
        observed_at,
    })
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Open the feed. Events arrive on the returned receiver until the
    /// connection ends, at which point the channel closes. No reconnect.
    async fn subscribe(&self) -> Result<mpsc::Receiver<Event>>;
    fn name(&self) -> &'static str;
}
