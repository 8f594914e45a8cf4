use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use strum_macros::EnumDiscriminants;

use crate::types::SessionId;

/// Every event the agent server pushes over the session channel.
///
/// Field names follow the wire (`toolId`, `outputTokens`, ...). Unknown extra
/// fields are ignored so the server can add metadata freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
#[strum_discriminants(name(EventKind))]
#[strum_discriminants(derive(Display, EnumString, Hash))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum ServerEvent {
    AssistantMessage {
        content: String,
    },
    ThinkingStart,
    ThinkingDelta {
        content: String,
    },
    ToolUse {
        tool_id: String,
        tool_name: String,
        #[serde(default)]
        tool_input: serde_json::Value,
    },
    ToolResult {
        tool_id: String,
        #[serde(default)]
        result: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    TokenUpdate {
        output_tokens: u64,
    },
    Result,
    Error {
        #[serde(default)]
        error_type: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    TimeoutWarning {
        message: String,
        #[serde(default)]
        elapsed_seconds: u64,
    },
    RetryAttempt {
        attempt: u32,
        max_attempts: u32,
        message: String,
        #[serde(default)]
        error_type: Option<String>,
    },
    ExitPlanMode {
        #[serde(default)]
        plan: Option<String>,
    },
    SessionTitleUpdated {
        new_title: String,
        #[serde(default)]
        session_id: Option<SessionId>,
    },
    ModeChanged {
        mode: String,
    },
    PermissionModeChanged {
        mode: String,
    },
    BackgroundProcessStarted {
        bash_id: String,
        command: String,
        #[serde(default)]
        description: Option<String>,
    },
    BackgroundProcessKilled {
        bash_id: String,
        #[serde(default)]
        command: Option<String>,
    },
    BackgroundProcessExited {
        bash_id: String,
        #[serde(default)]
        command: Option<String>,
        #[serde(default)]
        exit_code: Option<i32>,
    },
    LongRunningCommandStarted {
        bash_id: String,
        command: String,
        command_type: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, deserialize_with = "flexible_timestamp")]
        started_at: Option<DateTime<Utc>>,
    },
    LongRunningCommandOutput {
        bash_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    LongRunningCommandCompleted {
        bash_id: String,
        #[serde(default)]
        exit_code: Option<i32>,
    },
    AskUserQuestion {
        tool_id: String,
        #[serde(default)]
        questions: serde_json::Value,
    },
    QuestionAnswered,
    CompactStart {
        #[serde(default)]
        trigger: Option<String>,
        #[serde(default)]
        pre_tokens: Option<u64>,
    },
    CompactLoading,
    CompactComplete {
        #[serde(default)]
        pre_tokens: Option<u64>,
    },
    ContextUsage {
        input_tokens: u64,
        context_window: u64,
        context_percentage: f64,
        #[serde(default)]
        session_id: Option<SessionId>,
    },
    Keepalive {
        #[serde(default)]
        elapsed_seconds: u64,
    },
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }

    /// `result` and `error` end the current assistant turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result | Self::Error { .. })
    }

    /// Toast-only notices that are shown no matter which session is focused.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Self::TimeoutWarning { .. } | Self::RetryAttempt { .. })
    }
}

/// Classification of backend failures, used to pick the icon of the error block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    RateLimit,
    Overloaded,
    Authentication,
    Permission,
    InvalidRequest,
    RequestTooLarge,
    Network,
    #[strum(disabled)]
    Other,
}

impl ErrorKind {
    pub fn classify(error_type: Option<&str>) -> Self {
        error_type
            .and_then(|value| value.parse().ok())
            .unwrap_or(Self::Other)
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Timeout => "⏱️",
            Self::RateLimit => "🚦",
            Self::Overloaded => "🔥",
            Self::Authentication => "🔑",
            Self::Permission => "🚫",
            Self::InvalidRequest => "⚠️",
            Self::RequestTooLarge => "📦",
            Self::Network => "🌐",
            Self::Other => "❌",
        }
    }
}

/// Accepts RFC 3339 strings or epoch milliseconds.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Millis(millis)) => Ok(DateTime::from_timestamp_millis(millis)),
        Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}
