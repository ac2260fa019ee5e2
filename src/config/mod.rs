// src/config/mod.rs
//! Fixed aggregation constants plus the environment-driven deployment settings.

pub mod settings;

use std::time::Duration;

pub use settings::Settings;

/// Jetstream endpoint subscribed to the post collection only.
pub const DEFAULT_FEED_URL: &str =
    "wss://jetstream2.us-east.bsky.network/subscribe?wantedCollections=app.bsky.feed.post";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BLOCKLIST_PATH: &str = "config/blocklist.json";

/// Trailing window for the hashtag ranking (5 minutes).
pub const ROLLING_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Bucket width at session start.
pub const INITIAL_BUCKET_WIDTH: Duration = Duration::from_secs(5);
/// Bucket width once `WIDEN_AFTER` has elapsed.
pub const WIDENED_BUCKET_WIDTH: Duration = Duration::from_secs(60);
pub const WIDEN_AFTER: Duration = Duration::from_secs(2 * 60);

/// Number of sealed buckets kept per tag.
pub const HISTORY_CAP: usize = 20;

/// Recent matched messages kept for the chat list.
pub const MAX_CHAT_MESSAGES: usize = 100;

/// Bars shown in the hashtag ranking.
pub const TOP_HASHTAGS: usize = 10;

// --- env names ---
pub const ENV_BIND_ADDR: &str = "SKYPULSE_BIND";
pub const ENV_FEED_URL: &str = "SKYPULSE_FEED_URL";
pub const ENV_BLOCKLIST: &str = "SKYPULSE_BLOCKLIST";
pub const ENV_MATCH_POLICY: &str = "SKYPULSE_MATCH_POLICY";
pub const ENV_LOG_FORMAT: &str = "SKYPULSE_LOG_FORMAT";

/// Aggregation parameters handed to the controller.
#[derive(Debug, Clone)]
pub struct AggregationParams {
    pub window: Duration,
    pub initial_bucket: Duration,
    pub widened_bucket: Duration,
    pub widen_after: Duration,
    pub history_cap: usize,
    pub chat_cap: usize,
    pub top_n: usize,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            window: ROLLING_WINDOW,
            initial_bucket: INITIAL_BUCKET_WIDTH,
            widened_bucket: WIDENED_BUCKET_WIDTH,
            widen_after: WIDEN_AFTER,
            history_cap: HISTORY_CAP,
            chat_cap: MAX_CHAT_MESSAGES,
            top_n: TOP_HASHTAGS,
        }
    }
}
