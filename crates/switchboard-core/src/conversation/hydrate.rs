//! Rebuilds in-memory messages from rows of the persisted message store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::{ContentBlock, Message, Role};
use crate::types::MessageId;

/// One row as returned by the session directory.
///
/// Assistant `content` is a JSON-encoded block array for current rows and raw
/// text for legacy rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

pub fn hydrate_messages(rows: &[PersistedMessage]) -> Vec<Message> {
    rows.iter().map(hydrate_message).collect()
}

pub fn hydrate_message(row: &PersistedMessage) -> Message {
    let id = MessageId::from_string(row.id.clone());
    match row.role {
        Role::User => Message::user(id, row.content.clone(), row.timestamp),
        Role::Assistant => Message::assistant(id, parse_assistant_content(&row.content), row.timestamp),
    }
}

/// Parse-then-fallback: a JSON array becomes the block list, anything else is
/// kept verbatim as a single text block.
pub fn parse_assistant_content(raw: &str) -> Vec<ContentBlock> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ContentBlock>(item) {
                Ok(block) => Some(block),
                Err(err) => {
                    debug!(
                        target: "switchboard.hydrate",
                        error = %err,
                        "skipping unreadable persisted content block"
                    );
                    None
                }
            })
            .collect(),
        _ => vec![ContentBlock::text(raw)],
    }
}
