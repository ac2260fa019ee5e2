// src/chat.rs
//! Bounded list of the most recent matched posts, ready for a chat view.

use serde::Serialize;
use std::collections::VecDeque;

use crate::filter::Segment;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub text: String,
    /// Post creation time as sent by the feed; display only.
    pub created_at: Option<String>,
    pub matched: Vec<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub struct ChatLog {
    cap: usize,
    messages: VecDeque<ChatMessage>,
}

impl ChatLog {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            messages: VecDeque::new(),
        }
    }

    /// Append, dropping the oldest message once the cap is exceeded.
    pub fn push(&mut self, msg: ChatMessage) {
        self.messages.push_back(msg);
        if self.messages.len() > self.cap {
            self.messages.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(i: usize) -> ChatMessage {
        ChatMessage {
            text: format!("m{i}"),
            created_at: None,
            matched: vec![],
            segments: vec![],
        }
    }

    #[test]
    fn keeps_only_the_newest() {
        let mut log = ChatLog::with_cap(3);
        for i in 0..5 {
            log.push(msg(i));
        }
        let texts: Vec<&str> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }
}
