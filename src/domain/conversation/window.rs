//! Bounded, FIFO-trimmed conversation history.
//!
//! The window is owned by exactly one session and is handed by reference
//! into each orchestration call; when the session ends the window goes with
//! it. Capacity overflow evicts strictly oldest-first.

use std::collections::VecDeque;

use crate::domain::advisor::AdviceSource;
use crate::domain::foundation::SessionId;

use super::turn::{Turn, TurnRole};

/// Default number of turns kept, roughly five user/assistant exchanges.
pub const DEFAULT_WINDOW_TURNS: usize = 10;

/// Sliding window of the most recent conversation turns.
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    session_id: SessionId,
    capacity: usize,
    turns: VecDeque<Turn>,
    next_seq: u64,
}

impl ConversationWindow {
    /// Creates a window with the default capacity.
    pub fn new(session_id: SessionId) -> Self {
        Self::with_capacity(session_id, DEFAULT_WINDOW_TURNS)
    }

    /// Creates a window keeping at most `capacity` turns.
    ///
    /// A zero capacity is clamped to one so the most recent turn is always
    /// observable.
    pub fn with_capacity(session_id: SessionId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            session_id,
            capacity,
            turns: VecDeque::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a user turn, evicting the oldest turn past capacity.
    pub fn append_user(&mut self, content: impl Into<String>) -> u64 {
        self.append(TurnRole::User, content.into(), None)
    }

    /// Appends an assistant turn tagged with where the reply came from.
    pub fn append_assistant(&mut self, content: impl Into<String>, source: AdviceSource) -> u64 {
        self.append(TurnRole::Assistant, content.into(), Some(source))
    }

    fn append(&mut self, role: TurnRole, content: String, source: Option<AdviceSource>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.turns.push_back(Turn::new(role, content, seq, source));
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }

        seq
    }

    /// The retained turns, oldest to newest. This exact ordering is fed
    /// into the next LLM request.
    pub fn window(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Drops all retained turns. Explicit user action only; the seq counter
    /// keeps running so post-clear turns still order after pre-clear ones.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(capacity: usize) -> ConversationWindow {
        ConversationWindow::with_capacity(SessionId::new(), capacity)
    }

    #[test]
    fn append_keeps_oldest_to_newest_order() {
        let mut w = window(4);
        w.append_user("first");
        w.append_assistant("second", AdviceSource::Llm);
        w.append_user("third");

        let contents: Vec<_> = w.window().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn overflow_evicts_exactly_the_oldest() {
        let mut w = window(3);
        w.append_user("a");
        w.append_user("b");
        w.append_user("c");
        w.append_user("d");

        assert_eq!(w.len(), 3);
        let contents: Vec<_> = w.window().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c", "d"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut w = window(5);
        for i in 0..50 {
            w.append_user(format!("turn {}", i));
            assert!(w.len() <= 5);
        }
    }

    #[test]
    fn seq_is_monotone_across_eviction() {
        let mut w = window(2);
        for i in 0..10 {
            let seq = w.append_user(format!("turn {}", i));
            assert_eq!(seq, i);
        }

        let seqs: Vec<_> = w.window().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![8, 9]);
    }

    #[test]
    fn clear_empties_but_keeps_seq_running() {
        let mut w = window(4);
        w.append_user("before");
        w.clear();

        assert!(w.is_empty());
        assert_eq!(w.append_user("after"), 1);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut w = window(0);
        w.append_user("only");
        assert_eq!(w.len(), 1);
    }
}
