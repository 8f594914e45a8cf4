use serde_json::Value;

use super::event::{EventKind, ServerEvent};
use crate::error::DecodeError;
use crate::types::SessionId;

/// A decoded event together with the session it is scoped to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub session_id: Option<SessionId>,
    pub event: ServerEvent,
}

impl EventEnvelope {
    pub fn new(session_id: Option<SessionId>, event: ServerEvent) -> Self {
        Self { session_id, event }
    }

    pub fn unscoped(event: ServerEvent) -> Self {
        Self::new(None, event)
    }

    pub fn scoped(session_id: impl Into<SessionId>, event: ServerEvent) -> Self {
        Self::new(Some(session_id.into()), event)
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

pub fn decode_event(raw: &str) -> Result<EventEnvelope, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::InvalidJson)?;
    decode_value(value)
}

pub fn decode_value(value: Value) -> Result<EventEnvelope, DecodeError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    if kind.parse::<EventKind>().is_err() {
        return Err(DecodeError::UnknownType(kind));
    }

    let session_id = value
        .get("sessionId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(SessionId::from);

    let event = serde_json::from_value(value)
        .map_err(|source| DecodeError::Malformed { kind, source })?;

    Ok(EventEnvelope { session_id, event })
}
