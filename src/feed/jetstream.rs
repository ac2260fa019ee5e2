// src/feed/jetstream.rs
//! Bluesky Jetstream websocket client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use metrics::counter;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::{parse_frame, Event, FeedSource, FEED_CHANNEL_CAPACITY};

pub struct JetstreamFeed {
    url: String,
}

impl JetstreamFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl FeedSource for JetstreamFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<Event>> {
        let (mut ws, _response) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("connecting to {}", self.url))?;
        info!(target: "feed", url = %self.url, "jetstream connected");

        let (tx, rx) = mpsc::channel::<Event>(FEED_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(msg) = ws.next().await {
                let text = match msg {
                    Ok(Message::Text(t)) => t,
                    Ok(Message::Close(frame)) => {
                        info!(target: "feed", ?frame, "jetstream closed by server");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(target: "feed", error = %e, "jetstream read failed");
                        break;
                    }
                };

                counter!("feed_frames_total").increment(1);
                match parse_frame(text.as_str(), chrono::Utc::now()) {
                    Ok(ev) => {
                        if tx.send(ev).await.is_err() {
                            debug!(target: "feed", "controller gone; stopping reader");
                            break;
                        }
                    }
                    Err(e) => {
                        counter!("feed_frames_dropped_total").increment(1);
                        debug!(target: "feed", error = %e, "frame dropped");
                    }
                }
            }
            info!(target: "feed", "jetstream reader finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "jetstream"
    }
}
