use std::collections::VecDeque;
use switchboard_core::SessionId;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Recently left sessions, most recent at the front. Revisiting a session moves
/// it to the front instead of adding a second entry.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: VecDeque<SessionId>,
    limit: usize,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl NavigationHistory {
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, session_id: SessionId) {
        self.entries.retain(|existing| existing != &session_id);
        self.entries.push_front(session_id);
        self.entries.truncate(self.limit);
    }

    pub fn pop(&mut self) -> Option<SessionId> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<&SessionId> {
        self.entries.front()
    }

    pub fn remove(&mut self, session_id: &SessionId) {
        self.entries.retain(|existing| existing != session_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionId> {
        self.entries.iter()
    }
}
