//! Message types for conversation representation.
//!
//! - `Message` - one turn with id and timestamp
//! - `MessageBody` - plain text for user turns, content blocks for assistant turns
//! - `ContentBlock` - one structural unit of an assistant turn

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::types::MessageId;

/// Name of the tool that delegates work to a sub-agent.
pub const TASK_TOOL_NAME: &str = "Task";

/// Role in the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub body: MessageBody,
}

/// Role-specific content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", content = "content", rename_all = "snake_case")]
pub enum MessageBody {
    User(String),
    Assistant(Vec<ContentBlock>),
}

impl Message {
    pub fn user(id: MessageId, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            body: MessageBody::User(text.into()),
        }
    }

    pub fn assistant(id: MessageId, blocks: Vec<ContentBlock>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            body: MessageBody::Assistant(blocks),
        }
    }

    pub fn role(&self) -> Role {
        match self.body {
            MessageBody::User(_) => Role::User,
            MessageBody::Assistant(_) => Role::Assistant,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self.body, MessageBody::Assistant(_))
    }

    /// Content blocks of an assistant message; empty for user messages.
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.body {
            MessageBody::Assistant(blocks) => blocks,
            MessageBody::User(_) => &[],
        }
    }

    pub fn blocks_mut(&mut self) -> Option<&mut Vec<ContentBlock>> {
        match &mut self.body {
            MessageBody::Assistant(blocks) => Some(blocks),
            MessageBody::User(_) => None,
        }
    }

    /// Concatenated visible text of the message.
    pub fn text(&self) -> String {
        match &self.body {
            MessageBody::User(text) => text.clone(),
            MessageBody::Assistant(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse(ToolUse),
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    LongRunningCommand(LongRunningCommand),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn thinking(thinking: impl Into<String>) -> Self {
        Self::Thinking {
            thinking: thinking.into(),
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            Self::ToolUse(tool) => Some(tool),
            _ => None,
        }
    }
}

/// A tool invocation. `Task` invocations collect their sub-agent's calls in
/// `nested_tools`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_tools: Vec<ToolUse>,
}

impl ToolUse {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            nested_tools: Vec::new(),
        }
    }

    pub fn is_task(&self) -> bool {
        self.name == TASK_TOOL_NAME
    }

    /// True if this call or any call nested under it carries `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.id == id || self.nested_tools.iter().any(|nested| nested.contains_id(id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningCommand {
    pub bash_id: String,
    pub command: String,
    pub command_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub updates: Vec<CommandUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandUpdate {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_blocks_use_wire_field_names() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "tool-1".to_string(),
            content: json!("ok"),
            is_error: false,
        };
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(
            value,
            json!({"type": "tool_result", "toolUseId": "tool-1", "content": "ok", "isError": false})
        );
    }

    #[test]
    fn tool_use_nested_tools_deserialize_recursively() {
        let block: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use",
            "id": "t1",
            "name": "Task",
            "input": {"description": "explore"},
            "nestedTools": [{"id": "r1", "name": "Read", "input": {}}]
        }))
        .expect("deserialize");

        let tool = block.as_tool_use().expect("tool use");
        assert!(tool.is_task());
        assert_eq!(tool.nested_tools.len(), 1);
        assert!(tool.contains_id("r1"));
        assert!(!tool.contains_id("r2"));
    }

    #[test]
    fn message_text_joins_text_blocks_only() {
        let message = Message::assistant(
            MessageId::local(1),
            vec![
                ContentBlock::thinking("hmm"),
                ContentBlock::text("Hello, "),
                ContentBlock::ToolUse(ToolUse::new("t", "Read", json!({}))),
                ContentBlock::text("world"),
            ],
            Utc::now(),
        );
        assert_eq!(message.text(), "Hello, world");
        assert_eq!(message.role(), Role::Assistant);
    }

    #[test]
    fn user_message_serializes_with_role_and_string_content() {
        let timestamp = DateTime::from_timestamp(0, 0).expect("epoch");
        let message = Message::user(MessageId::from_string("m1"), "hi", timestamp);
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hi");
        assert_eq!(value["id"], "m1");
    }
}
