// src/blocklist.rs
//! Disallowed hashtags, loaded once at startup.
//!
//! Accepts either a JSON array (`["#spam", ...]`) or TOML (`tags = [...]`),
//! from a local file or an `http(s)` URL. Loading never blocks startup: on any
//! failure the caller gets an empty list (fail-open) and a warning in the log.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    tags: HashSet<String>,
}

impl Blocklist {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_tags<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = items
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { tags }
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, tag: &str) -> bool {
        if self.tags.is_empty() {
            return false;
        }
        self.tags.contains(&tag.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Load from a path or URL; parse errors and I/O errors are returned.
    pub async fn load(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let body = reqwest::get(source)
                .await
                .with_context(|| format!("fetching blocklist from {source}"))?
                .error_for_status()
                .with_context(|| format!("blocklist status from {source}"))?
                .text()
                .await
                .context("reading blocklist body")?;
            let ext = source.rsplit('.').next().unwrap_or_default();
            return parse_blocklist(&body, ext);
        }

        let path = Path::new(source);
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading blocklist from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_blocklist(&content, &ext)
    }

    /// Load once; on failure log and fall back to an empty blocklist.
    pub async fn load_or_empty(source: &str) -> Self {
        match Self::load(source).await {
            Ok(b) => {
                tracing::info!(target: "blocklist", source, tags = b.len(), "blocklist loaded");
                b
            }
            Err(e) => {
                tracing::warn!(target: "blocklist", source, error = %format!("{e:#}"), "blocklist unavailable; allowing all tags");
                Self::empty()
            }
        }
    }
}

fn parse_blocklist(s: &str, hint_ext: &str) -> Result<Blocklist> {
    if hint_ext.eq_ignore_ascii_case("toml") {
        return parse_toml(s);
    }
    if let Ok(b) = parse_json(s) {
        return Ok(b);
    }
    parse_toml(s).map_err(|_| anyhow!("unsupported blocklist format"))
}

fn parse_json(s: &str) -> Result<Blocklist> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(Blocklist::from_tags(v))
}

fn parse_toml(s: &str) -> Result<Blocklist> {
    #[derive(serde::Deserialize)]
    struct TomlList {
        tags: Vec<String>,
    }
    let v: TomlList = toml::from_str(s)?;
    Ok(Blocklist::from_tags(v.tags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_and_toml_formats_normalize() {
        let j = parse_blocklist(r##"[" #Spam ", "", "#scam"]"##, "json").unwrap();
        assert_eq!(j.len(), 2);
        assert!(j.contains("#spam"));
        assert!(j.contains("#SCAM"));

        let t = parse_blocklist(r##"tags = ["#NSFW"]"##, "toml").unwrap();
        assert!(t.contains("#nsfw"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_blocklist("not a list", "").is_err());
    }

    #[tokio::test]
    async fn missing_file_fails_open() {
        let b = Blocklist::load_or_empty("definitely/not/here.json").await;
        assert!(b.is_empty());
        assert!(!b.contains("#anything"));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("blocklist.json");
        std::fs::write(&p, r##"["#spam"]"##).unwrap();
        let b = Blocklist::load(p.to_str().unwrap()).await.unwrap();
        assert!(b.contains("#spam"));
    }
}
