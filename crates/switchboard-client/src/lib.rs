//! Client-side session orchestration for Switchboard.
//!
//! [`SessionController`] routes events from the single multiplexed channel
//! through the [`EventDispatcher`] into the focused conversation, and keeps
//! the caches that make switching between running sessions instant.

pub mod activity;
pub mod cache;
pub mod commands;
pub mod config;
pub mod controller;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod navigation;
pub mod notifications;
pub mod shortcuts;
pub mod usage;

pub use activity::{ActivityTracker, SessionActivity};
pub use cache::SessionCache;
pub use commands::CommandCache;
pub use config::{AppPaths, ClientConfig};
pub use controller::{ConversationUpdate, SessionController};
pub use directory::{
    DirectoryError, DirectorySnapshot, InMemorySessionDirectory, SessionDirectory, SessionSummary,
    SlashCommand,
};
pub use dispatcher::{EventDispatcher, Focus, Route};
pub use error::{Error, Result};
pub use navigation::NavigationHistory;
pub use notifications::{Toast, ToastQueue};
pub use shortcuts::{NavigationCommand, ShortcutOutcome, match_shortcut};
pub use usage::{ContextUsageMap, ContextUsageSnapshot};
