use std::collections::HashMap;
use switchboard_core::{ActivityState, ActivityStatus, SessionId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionActivity {
    pub loading: bool,
    pub activity: ActivityState,
}

/// Running/idle flag per session, kept apart from message content so the
/// session list can show progress for sessions that are not on screen.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    sessions: HashMap<SessionId, SessionActivity>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, session_id: &SessionId, loading: bool, activity: &ActivityState) {
        self.sessions.insert(
            session_id.clone(),
            SessionActivity {
                loading,
                activity: activity.clone(),
            },
        );
    }

    /// A background session's turn ended; only its flags change.
    pub fn finish(&mut self, session_id: &SessionId, status: ActivityStatus) {
        let entry = self.sessions.entry(session_id.clone()).or_default();
        entry.loading = false;
        entry.activity.finish(status);
    }

    pub fn is_loading(&self, session_id: &SessionId) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|entry| entry.loading)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&SessionActivity> {
        self.sessions.get(session_id)
    }

    pub fn loading_sessions(&self) -> impl Iterator<Item = &SessionId> {
        self.sessions
            .iter()
            .filter(|(_, entry)| entry.loading)
            .map(|(id, _)| id)
    }

    pub fn forget(&mut self, session_id: &SessionId) {
        self.sessions.remove(session_id);
    }
}
