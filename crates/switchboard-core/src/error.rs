//! Error types for switchboard-core

use thiserror::Error;

/// Reasons a raw wire frame could not be turned into an event.
///
/// None of these are fatal: the dispatcher logs and skips the frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid event JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("event has no `type` field")]
    MissingType,

    #[error("unknown event type: {0}")]
    UnknownType(String),

    #[error("malformed `{kind}` event: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
