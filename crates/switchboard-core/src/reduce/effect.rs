use serde::Serialize;
use strum_macros::Display;

use crate::types::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnOutcome {
    Completed,
    Failed,
}

/// Work the reducer asks its owner to perform after a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify {
        level: NoticeLevel,
        message: String,
    },

    /// A terminal event ended the assistant turn of `session_id`.
    TurnFinalized {
        session_id: Option<SessionId>,
        outcome: TurnOutcome,
    },

    ModeChanged {
        mode: String,
    },

    PermissionModeChanged {
        mode: String,
    },

    TitleUpdated {
        session_id: SessionId,
        title: String,
    },

    PlanReady {
        plan: Option<String>,
    },

    QuestionAsked {
        tool_id: String,
    },
}

impl Effect {
    pub fn notify(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::Notify {
            level,
            message: message.into(),
        }
    }
}
