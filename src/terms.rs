// src/terms.rs
//! Tracked keyword/hashtag set: normalized, unique, insertion-ordered.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
    #[error("please enter at least one term")]
    Empty,
    #[error("tracking has already been started")]
    AlreadyStarted,
}

/// Lower-case and trim a user-supplied term.
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Ordered set of terms the user wants to monitor.
///
/// Small by nature (a handful of UI entries), so a `Vec` with linear
/// membership checks keeps insertion order for free.
#[derive(Debug, Clone, Default)]
pub struct TrackedTerms {
    terms: Vec<String>,
}

impl TrackedTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one term. Returns the normalized term and whether it was newly inserted.
    pub fn add(&mut self, raw: &str) -> Result<(String, bool), TermError> {
        let term = normalize_term(raw);
        if term.is_empty() {
            return Err(TermError::Empty);
        }
        if self.contains(&term) {
            return Ok((term, false));
        }
        self.terms.push(term.clone());
        Ok((term, true))
    }

    /// Add a comma-separated batch. Empty pieces are skipped; an input with no
    /// usable piece at all is rejected. Returns the newly inserted terms.
    pub fn add_batch(&mut self, input: &str) -> Result<Vec<String>, TermError> {
        let pieces = parse_batch(input);
        if pieces.is_empty() {
            return Err(TermError::Empty);
        }
        let mut added = Vec::new();
        for p in pieces {
            if let Ok((t, true)) = self.add(&p) {
                added.push(t);
            }
        }
        Ok(added)
    }

    /// Remove a term (matched after normalization). Returns true if it was present.
    pub fn remove(&mut self, raw: &str) -> bool {
        let term = normalize_term(raw);
        let before = self.terms.len();
        self.terms.retain(|t| *t != term);
        self.terms.len() != before
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Split a batch submission on commas into normalized, non-empty terms.
pub fn parse_batch(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(normalize_term)
        .filter(|t| !t.is_empty())
        .collect()
}
