//! Reducer tests.
//!
//! - Scenarios: hand-written event sequences with exact expected state
//! - Property tests: randomized checks of streaming and nesting invariants

mod scenarios;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::events::ServerEvent;
use crate::reduce::{Effect, reduce};
use crate::state::SessionState;
use crate::types::SessionId;

fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

fn session(id: &str) -> SessionState {
    SessionState::new(Some(SessionId::from(id)))
}

fn apply(state: &mut SessionState, events: &[ServerEvent]) -> Vec<Effect> {
    events
        .iter()
        .flat_map(|event| reduce(state, event, fixed_now()))
        .collect()
}

fn text(content: &str) -> ServerEvent {
    ServerEvent::AssistantMessage {
        content: content.to_string(),
    }
}

fn thinking(content: &str) -> ServerEvent {
    ServerEvent::ThinkingDelta {
        content: content.to_string(),
    }
}

fn tool(name: &str, id: &str) -> ServerEvent {
    ServerEvent::ToolUse {
        tool_id: id.to_string(),
        tool_name: name.to_string(),
        tool_input: json!({"file_path": format!("src/{id}.rs")}),
    }
}
