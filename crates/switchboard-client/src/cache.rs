use std::collections::HashMap;
use switchboard_core::{Message, SessionId};
use tracing::debug;

/// Messages of sessions that were left while a turn was still streaming.
///
/// An entry lives only until the session is shown again or its turn is
/// finalized; a finalized session is always refetched.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<SessionId, Vec<Message>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, session_id: SessionId, messages: Vec<Message>) {
        debug!(
            target: "switchboard.cache",
            session_id = %session_id,
            messages = messages.len(),
            "caching session messages"
        );
        self.entries.insert(session_id, messages);
    }

    /// Remove and return the cached messages for `session_id`.
    pub fn take(&mut self, session_id: &SessionId) -> Option<Vec<Message>> {
        self.entries.remove(session_id)
    }

    pub fn evict(&mut self, session_id: &SessionId) -> bool {
        let removed = self.entries.remove(session_id).is_some();
        if removed {
            debug!(target: "switchboard.cache", session_id = %session_id, "evicted cache entry");
        }
        removed
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.entries.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
