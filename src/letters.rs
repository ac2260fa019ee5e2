// src/letters.rs
//! Cumulative a–z letter counts over every matched post of the session.

pub const ALPHABET: usize = 26;

#[derive(Debug, Clone, Default)]
pub struct LetterFrequency {
    counts: [u64; ALPHABET],
}

impl LetterFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every a–z character of the lower-cased text. Returns the letters
    /// that changed, one entry per occurrence (duplicates included).
    pub fn observe(&mut self, text: &str) -> Vec<char> {
        let mut changed = Vec::new();
        for c in text.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() {
                self.counts[(c as u8 - b'a') as usize] += 1;
                changed.push(c);
            }
        }
        changed
    }

    /// Count for a single letter; anything outside a–z reads as 0.
    pub fn count(&self, letter: char) -> u64 {
        let c = letter.to_ascii_lowercase();
        if c.is_ascii_lowercase() {
            self.counts[(c as u8 - b'a') as usize]
        } else {
            0
        }
    }

    /// Counts in alphabetical order.
    pub fn values(&self) -> &[u64; ALPHABET] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// `a..=z` as chart labels.
pub fn letter_labels() -> Vec<String> {
    ('a'..='z').map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_occurrence_case_insensitively() {
        let mut lf = LetterFrequency::new();
        let changed = lf.observe("I love my Cat!");
        assert_eq!(
            changed,
            vec!['i', 'l', 'o', 'v', 'e', 'm', 'y', 'c', 'a', 't']
        );
        for c in ['i', 'l', 'o', 'v', 'e', 'm', 'y', 'c', 'a', 't'] {
            assert_eq!(lf.count(c), 1, "letter {c}");
        }
        assert_eq!(lf.count('z'), 0);
        assert_eq!(lf.total(), 10);
    }

    #[test]
    fn duplicates_are_reported_per_occurrence() {
        let mut lf = LetterFrequency::new();
        assert_eq!(lf.observe("aA a"), vec!['a', 'a', 'a']);
        assert_eq!(lf.count('A'), 3);
    }

    #[test]
    fn non_letters_are_ignored() {
        let mut lf = LetterFrequency::new();
        assert!(lf.observe("123 #_ é ß").is_empty());
        assert_eq!(lf.total(), 0);
    }

    #[test]
    fn counts_never_decrease() {
        let mut lf = LetterFrequency::new();
        let texts = ["abc", "", "zzz", "Hello, World", "ABC abc"];
        let mut prev = *lf.values();
        for t in texts {
            lf.observe(t);
            for (now, before) in lf.values().iter().zip(prev.iter()) {
                assert!(now >= before);
            }
            prev = *lf.values();
        }
        assert_eq!(lf.count('a'), 3);
        assert_eq!(lf.count('z'), 3);
        assert_eq!(lf.count('l'), 3);
    }

    #[test]
    fn labels_cover_alphabet() {
        let l = letter_labels();
        assert_eq!(l.len(), ALPHABET);
        assert_eq!(l.first().map(String::as_str), Some("a"));
        assert_eq!(l.last().map(String::as_str), Some("z"));
    }
}
