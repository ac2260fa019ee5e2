// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;

use super::{
    DEFAULT_BIND_ADDR, DEFAULT_BLOCKLIST_PATH, DEFAULT_FEED_URL, ENV_BIND_ADDR, ENV_BLOCKLIST,
    ENV_FEED_URL, ENV_LOG_FORMAT, ENV_MATCH_POLICY,
};
use crate::filter::MatchPolicy;

/// Deployment knobs. Aggregation constants live in `config` and are not configurable.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub feed_url: String,
    /// File path or `http(s)://` URL.
    pub blocklist: String,
    pub policy: MatchPolicy,
    pub json_logs: bool,
}

impl Settings {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env`, but with an injectable lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = non_empty(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("{ENV_BIND_ADDR} is not a socket address: {bind_raw}"))?;

        let policy = match non_empty(ENV_MATCH_POLICY) {
            None => MatchPolicy::default(),
            Some(raw) => raw
                .parse::<MatchPolicy>()
                .map_err(|e| anyhow!("{ENV_MATCH_POLICY}: {e}"))?,
        };

        let json_logs = non_empty(ENV_LOG_FORMAT)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            bind,
            feed_url: non_empty(ENV_FEED_URL).unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            blocklist: non_empty(ENV_BLOCKLIST)
                .unwrap_or_else(|| DEFAULT_BLOCKLIST_PATH.to_string()),
            policy,
            json_logs,
        })
    }
}
