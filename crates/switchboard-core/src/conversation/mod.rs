pub mod hydrate;
pub mod message;

pub use hydrate::{PersistedMessage, hydrate_message, hydrate_messages, parse_assistant_content};
pub use message::{
    CommandUpdate, ContentBlock, LongRunningCommand, Message, MessageBody, Role, TASK_TOOL_NAME,
    ToolUse,
};
