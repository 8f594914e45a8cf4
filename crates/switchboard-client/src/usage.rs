use std::collections::HashMap;
use switchboard_core::{ServerEvent, SessionId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextUsageSnapshot {
    pub input_tokens: u64,
    pub context_window: u64,
    pub context_percentage: f64,
}

impl ContextUsageSnapshot {
    pub fn from_event(event: &ServerEvent) -> Option<Self> {
        match event {
            ServerEvent::ContextUsage {
                input_tokens,
                context_window,
                context_percentage,
                ..
            } => Some(Self {
                input_tokens: *input_tokens,
                context_window: *context_window,
                context_percentage: *context_percentage,
            }),
            _ => None,
        }
    }

    pub fn remaining_tokens(&self) -> u64 {
        self.context_window.saturating_sub(self.input_tokens)
    }
}

/// Latest context-window usage per session, updated regardless of focus.
#[derive(Debug, Clone, Default)]
pub struct ContextUsageMap {
    by_session: HashMap<SessionId, ContextUsageSnapshot>,
}

impl ContextUsageMap {
    pub fn update(&mut self, session_id: SessionId, snapshot: ContextUsageSnapshot) {
        self.by_session.insert(session_id, snapshot);
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&ContextUsageSnapshot> {
        self.by_session.get(session_id)
    }

    pub fn remove(&mut self, session_id: &SessionId) {
        self.by_session.remove(session_id);
    }
}
