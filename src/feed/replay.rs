// src/feed/replay.rs
//! Feed that replays recorded Jetstream frames, then closes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::{parse_frame, Event, FeedSource, FEED_CHANNEL_CAPACITY};

pub struct ReplayFeed {
    frames: Mutex<Option<Vec<String>>>,
}

impl ReplayFeed {
    pub fn from_frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: Mutex::new(Some(frames.into_iter().map(Into::into).collect())),
        }
    }

    /// Wrap plain post texts into minimal Jetstream commit frames.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let frames: Vec<String> = texts
            .into_iter()
            .map(|t| serde_json::json!({ "commit": { "record": { "text": t.as_ref() } } }).to_string())
            .collect();
        Self::from_frames(frames)
    }
}

#[async_trait]
impl FeedSource for ReplayFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<Event>> {
        let frames = self
            .frames
            .lock()
            .map_err(|_| anyhow!("replay feed mutex poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("replay feed already consumed"))?;

        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for raw in frames {
                counter!("feed_frames_total").increment(1);
                match parse_frame(&raw, chrono::Utc::now()) {
                    Ok(ev) => {
                        if tx.send(ev).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        counter!("feed_frames_dropped_total").increment(1);
                        tracing::debug!(target: "feed", error = %e, "replayed frame dropped");
                    }
                }
            }
        });
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_valid_frames_then_closes() {
        let feed = ReplayFeed::from_frames(vec![
            r#"{"commit":{"record":{"text":"one"}}}"#.to_string(),
            "not json".to_string(),
            r#"{"commit":{"record":{"text":"two","createdAt":"x"}}}"#.to_string(),
        ]);
        let mut rx = feed.subscribe().await.unwrap();
        assert_eq!(rx.recv().await.unwrap().text, "one");
        let two = rx.recv().await.unwrap();
        assert_eq!(two.created_at.as_deref(), Some("x"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn second_subscribe_fails() {
        let feed = ReplayFeed::from_texts(["a"]);
        let _rx = feed.subscribe().await.unwrap();
        assert!(feed.subscribe().await.is_err());
    }
}
