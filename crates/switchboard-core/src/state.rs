use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use strum_macros::Display;

use crate::conversation::{ContentBlock, Message};
use crate::types::{MessageId, SessionId};

/// Coarse progress indicator for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Idle,
    Thinking,
    ToolUse,
    Writing,
    Completed,
    Error,
}

/// Live progress metadata, kept apart from message content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityState {
    pub is_active: bool,
    pub status: ActivityStatus,
    pub current_tool: Option<String>,
    pub current_file: Option<String>,
    pub current_tool_id: Option<String>,
}

impl ActivityState {
    /// Enter a running status that is not tied to a tool.
    pub fn enter(&mut self, status: ActivityStatus) {
        self.is_active = true;
        self.status = status;
        self.clear_tool();
    }

    pub fn enter_tool(&mut self, tool_id: &str, tool_name: &str, file: Option<String>) {
        self.is_active = true;
        self.status = ActivityStatus::ToolUse;
        self.current_tool = Some(tool_name.to_string());
        self.current_tool_id = Some(tool_id.to_string());
        self.current_file = file;
    }

    /// End the turn with `Completed` or `Error`.
    pub fn finish(&mut self, status: ActivityStatus) {
        self.is_active = false;
        self.status = status;
        self.clear_tool();
    }

    fn clear_tool(&mut self) {
        self.current_tool = None;
        self.current_file = None;
        self.current_tool_id = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessStatus {
    Running,
    Killed,
    Exited { exit_code: Option<i32> },
}

/// A shell process the agent left running in the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundProcess {
    pub bash_id: String,
    pub command: String,
    pub description: Option<String>,
    pub status: ProcessStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CompactionStatus {
    #[default]
    Idle,
    Compacting {
        trigger: Option<String>,
        pre_tokens: Option<u64>,
    },
    Loading,
}

/// A question the agent is waiting on the user to answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuestion {
    pub tool_id: String,
    pub questions: serde_json::Value,
}

/// Reconstructed view of one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: Option<SessionId>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub live_output_tokens: u64,
    pub activity: ActivityState,
    pub mode: Option<String>,
    pub permission_mode: Option<String>,
    pub title: Option<String>,
    pub pending_plan: Option<String>,
    pub pending_question: Option<PendingQuestion>,
    pub background_processes: IndexMap<String, BackgroundProcess>,
    pub compaction: CompactionStatus,
    #[serde(skip)]
    next_local_id: u64,
}

impl SessionState {
    pub fn new(session_id: Option<SessionId>) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    /// State restored from the store or the cache. Local ids continue after
    /// the restored messages so they never collide with earlier local ids.
    pub fn with_messages(session_id: SessionId, messages: Vec<Message>) -> Self {
        Self {
            session_id: Some(session_id),
            next_local_id: messages.len() as u64,
            messages,
            ..Self::default()
        }
    }

    pub fn next_message_id(&mut self) -> MessageId {
        self.next_local_id += 1;
        MessageId::local(self.next_local_id)
    }

    /// Append the user's turn and mark the session as running.
    pub fn push_user_message(&mut self, text: impl Into<String>, now: DateTime<Utc>) -> &Message {
        let id = self.next_message_id();
        self.messages.push(Message::user(id, text, now));
        self.loading = true;
        self.activity.enter(ActivityStatus::Thinking);
        self.pending_plan = None;
        &self.messages[self.messages.len() - 1]
    }

    pub fn tail_is_assistant(&self) -> bool {
        self.messages.last().is_some_and(Message::is_assistant)
    }

    /// Blocks of the open assistant message, if the tail is assistant-authored.
    pub fn open_assistant_blocks(&mut self) -> Option<&mut Vec<ContentBlock>> {
        self.messages.last_mut().and_then(Message::blocks_mut)
    }

    /// Blocks of the open assistant message, opening a new turn first when the
    /// tail is absent or user-authored. A new turn resets the live token count.
    pub fn ensure_assistant_blocks(&mut self, now: DateTime<Utc>) -> Option<&mut Vec<ContentBlock>> {
        if !self.tail_is_assistant() {
            self.live_output_tokens = 0;
            let id = self.next_message_id();
            self.messages.push(Message::assistant(id, Vec::new(), now));
        }
        self.open_assistant_blocks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_assistant_blocks_opens_one_turn_and_reuses_it() {
        let mut state = SessionState::new(Some(SessionId::from("s")));
        state.live_output_tokens = 42;

        state
            .ensure_assistant_blocks(Utc::now())
            .expect("assistant turn")
            .push(ContentBlock::text("a"));
        assert_eq!(state.live_output_tokens, 0);

        state.live_output_tokens = 5;
        state
            .ensure_assistant_blocks(Utc::now())
            .expect("assistant turn")
            .push(ContentBlock::text("b"));

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].blocks().len(), 2);
        assert_eq!(state.live_output_tokens, 5);
    }

    #[test]
    fn user_message_starts_loading_and_breaks_assistant_tail() {
        let mut state = SessionState::default();
        state.ensure_assistant_blocks(Utc::now());
        state.push_user_message("next question", Utc::now());

        assert!(state.loading);
        assert_eq!(state.activity.status, ActivityStatus::Thinking);
        assert!(!state.tail_is_assistant());
        assert!(state.open_assistant_blocks().is_none());
        assert_eq!(state.messages[1].id.as_str(), "local-2");
    }

    #[test]
    fn restored_state_continues_local_ids() {
        let mut original = SessionState::default();
        original.push_user_message("one", Utc::now());
        original.ensure_assistant_blocks(Utc::now());

        let mut restored =
            SessionState::with_messages(SessionId::from("s"), original.messages.clone());
        let next = restored.push_user_message("two", Utc::now()).id.clone();
        assert_eq!(next.as_str(), "local-3");
    }

    #[test]
    fn finishing_clears_tool_metadata() {
        let mut activity = ActivityState::default();
        activity.enter_tool("t1", "Edit", Some("src/main.rs".to_string()));
        assert!(activity.is_active);
        assert_eq!(activity.current_file.as_deref(), Some("src/main.rs"));

        activity.finish(ActivityStatus::Completed);
        assert!(!activity.is_active);
        assert_eq!(activity.status, ActivityStatus::Completed);
        assert_eq!(activity.current_tool, None);
        assert_eq!(activity.current_tool_id, None);
    }
}
