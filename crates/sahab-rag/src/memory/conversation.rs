//! Per-session conversation memory

use crate::types::{ChatMessage, ConversationTurn};

/// Ordered record of a session's turns
///
/// Turns are kept until `clear` is called; only the window handed to the
/// prompt is bounded.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    /// Empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a client-supplied history
    pub fn from_history(history: &[ChatMessage]) -> Self {
        Self {
            turns: history.to_vec(),
        }
    }

    /// Record a turn
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Last `n` turns, oldest first
    pub fn window(&self, n: usize) -> Vec<ConversationTurn> {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..].to_vec()
    }

    /// Forget every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of stored turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Every stored turn, oldest first
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }
}
