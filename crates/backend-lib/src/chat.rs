//! Bounded chat log. Oldest messages are dropped first.
use std::collections::VecDeque;

use chamber_common::{ChatMessage, DEFAULT_CHAT_CAPACITY};

#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHAT_CAPACITY)
    }
}

impl ChatLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
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
    use chrono::Utc;

    fn msg(n: usize) -> ChatMessage {
        ChatMessage {
            author: "ana".to_string(),
            text: format!("message {n}"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_under_capacity() {
        let mut log = ChatLog::default();
        for n in 1..=3 {
            log.append(msg(n));
        }
        let texts: Vec<String> = log.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["message 1", "message 2", "message 3"]);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut log = ChatLog::default();
        for n in 1..=101 {
            log.append(msg(n));
        }
        let messages = log.messages();
        assert_eq!(messages.len(), 100);
        assert_eq!(messages.first().unwrap().text, "message 2");
        assert_eq!(messages.last().unwrap().text, "message 101");
        for (i, m) in messages.iter().enumerate() {
            assert_eq!(m.text, format!("message {}", i + 2));
        }
    }

    #[test]
    fn test_keeps_last_n_for_any_count() {
        for total in [0usize, 1, 5, 6, 17] {
            let mut log = ChatLog::with_capacity(5);
            for n in 0..total {
                log.append(msg(n));
            }
            let expected: Vec<String> = (total.saturating_sub(5)..total)
                .map(|n| format!("message {n}"))
                .collect();
            let texts: Vec<String> = log.messages().into_iter().map(|m| m.text).collect();
            assert_eq!(texts, expected);
            assert!(log.len() <= 5);
        }
    }
}
