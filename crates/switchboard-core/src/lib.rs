//! Conversation model and streaming reconstruction for Switchboard.
//!
//! Everything in this crate is synchronous and free of I/O: events are decoded
//! from the wire, then folded into a [`SessionState`] by [`reduce`].

pub mod conversation;
pub mod error;
pub mod events;
pub mod reduce;
pub mod state;
pub mod types;

pub use conversation::{
    CommandUpdate, ContentBlock, LongRunningCommand, Message, MessageBody, PersistedMessage, Role,
    ToolUse, hydrate_message, hydrate_messages,
};
pub use error::DecodeError;
pub use events::{ErrorKind, EventEnvelope, EventKind, ServerEvent, decode_event, decode_value};
pub use reduce::{Effect, NoticeLevel, TurnOutcome, reduce};
pub use state::{ActivityState, ActivityStatus, SessionState};
pub use types::{MessageId, SessionId};
