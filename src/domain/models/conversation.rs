use serde::Serialize;

use super::{ErrorInfo, Turn};

/// Append-only log of turns plus the loading flag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
    loading: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> &Turn {
        self.push(Turn::user(text))
    }

    pub fn append_assistant(&mut self, turn: Turn) -> &Turn {
        self.push(turn)
    }

    pub fn append_error(&mut self, error: ErrorInfo) -> &Turn {
        self.push(Turn::failed(error))
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Id of the most recent turn, used as the next request's parent.
    pub fn last_message_id(&self) -> Option<&str> {
        self.turns.last().and_then(Turn::id)
    }

    fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        // just pushed
        &self.turns[self.turns.len() - 1]
    }
}
