// src/filter.rs
//! Filter stage: decides whether a post matches the tracked terms and pulls
//! hashtags out of it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::blocklist::Blocklist;
use crate::terms::TrackedTerms;

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\w+").expect("word regex"));
static RE_HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)#\w+").expect("hashtag regex"));

/// How tracked terms are matched against post text.
///
/// The two policies intentionally disagree on multiplicity: `Substring`
/// reports at most one term per post, `Tokenized` reports every term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// First tracked term (in tracking order) contained anywhere in the text.
    Substring,
    /// Every tracked term equal to a whole word token of the text.
    #[default]
    Tokenized,
}

impl MatchPolicy {
    /// Returns the matched terms, in tracking order. Empty means "drop the event".
    pub fn matches(self, text: &str, terms: &TrackedTerms) -> Vec<String> {
        if terms.is_empty() {
            return Vec::new();
        }
        let lower = text.to_lowercase();
        match self {
            MatchPolicy::Substring => terms
                .iter()
                .find(|t| lower.contains(*t))
                .map(|t| vec![t.to_string()])
                .unwrap_or_default(),
            MatchPolicy::Tokenized => {
                let words: Vec<&str> = RE_WORD.find_iter(&lower).map(|m| m.as_str()).collect();
                terms
                    .iter()
                    .filter(|t| words.contains(t))
                    .map(str::to_string)
                    .collect()
            }
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Substring => f.write_str("substring"),
            MatchPolicy::Tokenized => f.write_str("tokenized"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(MatchPolicy::Substring),
            "tokenized" | "word" | "words" => Ok(MatchPolicy::Tokenized),
            other => Err(format!("unknown match policy '{other}'")),
        }
    }
}

/// Extract `#word` tokens, lower-cased, in text order (duplicates kept),
/// minus anything on the blocklist. A blocklist entry matches with or
/// without its leading `#`.
pub fn extract_hashtags(text: &str, blocklist: &Blocklist) -> Vec<String> {
    RE_HASHTAG
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|tag| !blocklist.contains(tag) && !blocklist.contains(&tag[1..]))
        .collect()
}

/// A run of text, flagged when it is a tracked word (for highlighting).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub highlight: bool,
}

/// Split text on word boundaries, flagging word tokens that are tracked terms.
/// Concatenating the segments yields the original text.
pub fn highlight_segments(text: &str, terms: &TrackedTerms) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in RE_WORD.find_iter(text) {
        if m.start() > last {
            out.push(Segment {
                text: text[last..m.start()].to_string(),
                highlight: false,
            });
        }
        out.push(Segment {
            text: m.as_str().to_string(),
            highlight: terms.contains(&m.as_str().to_lowercase()),
        });
        last = m.end();
    }
    if last < text.len() {
        out.push(Segment {
            text: text[last..].to_string(),
            highlight: false,
        });
    }
    out
}
