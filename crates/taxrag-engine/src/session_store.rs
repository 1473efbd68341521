use std::collections::HashMap;

use crate::conversation::ConversationState;

/// Caller-owned conversations keyed by session id.
///
/// Entries live until the caller deletes them.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, ConversationState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation for `id`, created empty on first use.
    pub fn get(&mut self, id: &str) -> &mut ConversationState {
        self.sessions.entry(id.to_string()).or_default()
    }

    pub fn peek(&self, id: &str) -> Option<&ConversationState> {
        self.sessions.get(id)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
