//! Decides what an incoming event may touch given the session in focus.
//!
//! Structural events for unfocused sessions are dropped. Context usage,
//! advisory toasts, title updates and the loading-clear of a background
//! terminal event get through.

use switchboard_core::{EventEnvelope, ServerEvent, SessionId};
use tracing::trace;

/// The controller's view of which session owns the conversation pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus<'a> {
    Session(&'a SessionId),
    /// A new chat was started and the server has not assigned its id yet.
    AwaitingNewSession,
    Idle,
}

impl Focus<'_> {
    fn session_id(&self) -> Option<&SessionId> {
        match self {
            Focus::Session(id) => Some(id),
            Focus::AwaitingNewSession | Focus::Idle => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Reduce into the focused conversation.
    Apply,
    /// First event of a new chat; take over its session id, then apply.
    Adopt(SessionId),
    /// Record usage for this session, whichever is focused.
    ContextUsage(SessionId),
    /// Show as a toast without touching any conversation.
    Advisory,
    /// A background session finished its turn; clear its loading flag only.
    BackgroundTerminal(SessionId),
    Drop,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EventDispatcher;

impl EventDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, envelope: &EventEnvelope, focus: Focus<'_>) -> Route {
        let event = &envelope.event;
        let event_session = envelope.session_id.as_ref();

        if let ServerEvent::ContextUsage { session_id, .. } = event {
            return session_id
                .as_ref()
                .or(event_session)
                .or(focus.session_id())
                .cloned()
                .map_or(Route::Drop, Route::ContextUsage);
        }

        if event.is_advisory() {
            return Route::Advisory;
        }

        // Titles only touch session metadata; the reducer ignores ones aimed
        // at another session apart from reporting them.
        if matches!(event, ServerEvent::SessionTitleUpdated { .. }) {
            return Route::Apply;
        }

        let Some(event_session) = event_session else {
            return Route::Apply;
        };

        match focus {
            Focus::Session(active) if active == event_session => Route::Apply,
            Focus::AwaitingNewSession => Route::Adopt(event_session.clone()),
            _ if event.is_terminal() => Route::BackgroundTerminal(event_session.clone()),
            _ => {
                trace!(
                    target: "switchboard.dispatch",
                    kind = %event.kind(),
                    session_id = %event_session,
                    "dropping event for unfocused session"
                );
                Route::Drop
            }
        }
    }
}
