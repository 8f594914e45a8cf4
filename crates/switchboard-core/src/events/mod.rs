//! Wire event taxonomy and decoding.

pub mod decode;
pub mod event;

pub use decode::{EventEnvelope, decode_event, decode_value};
pub use event::{ErrorKind, EventKind, ServerEvent};
