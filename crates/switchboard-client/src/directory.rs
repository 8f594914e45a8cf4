//! Read contract with the authoritative session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use switchboard_core::{PersistedMessage, SessionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Directory backend error: {message}")]
    Backend { message: String },

    #[error("In-memory directory lock poisoned: {message}")]
    LockPoisoned { message: String },
}

impl DirectoryError {
    pub fn session_not_found(session_id: &SessionId) -> Self {
        Self::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn lock_poisoned(message: impl Into<String>) -> Self {
        Self::LockPoisoned {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// All sessions, most recently updated first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, DirectoryError>;

    async fn fetch_session_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<PersistedMessage>, DirectoryError>;

    async fn list_slash_commands(
        &self,
        working_directory: &Path,
    ) -> Result<Vec<SlashCommand>, DirectoryError>;

    async fn rename_session(&self, session_id: &SessionId, title: &str)
    -> Result<(), DirectoryError>;

    async fn set_working_directory(
        &self,
        session_id: &SessionId,
        working_directory: &Path,
    ) -> Result<(), DirectoryError>;
}

/// Serialized contents of an [`InMemorySessionDirectory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySnapshot {
    pub sessions: Vec<SessionSummary>,
    pub messages: HashMap<SessionId, Vec<PersistedMessage>>,
    /// Slash commands keyed by working directory path.
    pub commands: HashMap<String, Vec<SlashCommand>>,
}

/// Directory kept entirely in memory. Counts fetches so callers can tell a
/// cache hit from a round trip.
#[derive(Default)]
pub struct InMemorySessionDirectory {
    sessions: RwLock<HashMap<SessionId, SessionSummary>>,
    messages: RwLock<HashMap<SessionId, Vec<PersistedMessage>>>,
    commands: RwLock<HashMap<String, Vec<SlashCommand>>>,
    message_fetches: RwLock<HashMap<SessionId, usize>>,
    command_fetches: AtomicUsize,
    fail_commands: AtomicBool,
    fail_messages: AtomicBool,
}

impl InMemorySessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            sessions: RwLock::new(
                snapshot
                    .sessions
                    .into_iter()
                    .map(|summary| (summary.id.clone(), summary))
                    .collect(),
            ),
            messages: RwLock::new(snapshot.messages),
            commands: RwLock::new(snapshot.commands),
            ..Self::default()
        }
    }

    pub fn insert_session(&self, summary: SessionSummary) -> Result<(), DirectoryError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| DirectoryError::lock_poisoned("sessions"))?;
        sessions.insert(summary.id.clone(), summary);
        Ok(())
    }

    /// Replace the persisted rows of a session, as the server does when a turn
    /// is finalized.
    pub fn put_messages(
        &self,
        session_id: &SessionId,
        rows: Vec<PersistedMessage>,
    ) -> Result<(), DirectoryError> {
        let mut messages = self
            .messages
            .write()
            .map_err(|_| DirectoryError::lock_poisoned("messages"))?;
        messages.insert(session_id.clone(), rows);
        Ok(())
    }

    pub fn put_commands(
        &self,
        working_directory: &Path,
        list: Vec<SlashCommand>,
    ) -> Result<(), DirectoryError> {
        let mut commands = self
            .commands
            .write()
            .map_err(|_| DirectoryError::lock_poisoned("commands"))?;
        commands.insert(path_key(working_directory), list);
        Ok(())
    }

    pub fn fail_command_listing(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    /// Make message fetches fail as an unreachable backend would.
    pub fn fail_message_fetches(&self, fail: bool) {
        self.fail_messages.store(fail, Ordering::SeqCst);
    }

    pub fn message_fetch_count(&self, session_id: &SessionId) -> usize {
        self.message_fetches
            .read()
            .map(|fetches| fetches.get(session_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn command_fetch_count(&self) -> usize {
        self.command_fetches.load(Ordering::SeqCst)
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl SessionDirectory for InMemorySessionDirectory {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, DirectoryError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| DirectoryError::lock_poisoned("sessions"))?;
        let mut list: Vec<SessionSummary> = sessions.values().cloned().collect();
        list.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }

    async fn fetch_session_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<PersistedMessage>, DirectoryError> {
        {
            let mut fetches = self
                .message_fetches
                .write()
                .map_err(|_| DirectoryError::lock_poisoned("message_fetches"))?;
            *fetches.entry(session_id.clone()).or_default() += 1;
        }
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(DirectoryError::backend("message history unavailable"));
        }

        let known = self
            .sessions
            .read()
            .map_err(|_| DirectoryError::lock_poisoned("sessions"))?
            .contains_key(session_id);
        let messages = self
            .messages
            .read()
            .map_err(|_| DirectoryError::lock_poisoned("messages"))?;

        match messages.get(session_id) {
            Some(rows) => Ok(rows.clone()),
            None if known => Ok(Vec::new()),
            None => Err(DirectoryError::session_not_found(session_id)),
        }
    }

    async fn list_slash_commands(
        &self,
        working_directory: &Path,
    ) -> Result<Vec<SlashCommand>, DirectoryError> {
        self.command_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(DirectoryError::backend("command listing unavailable"));
        }

        let commands = self
            .commands
            .read()
            .map_err(|_| DirectoryError::lock_poisoned("commands"))?;
        Ok(commands
            .get(&path_key(working_directory))
            .cloned()
            .unwrap_or_default())
    }

    async fn rename_session(
        &self,
        session_id: &SessionId,
        title: &str,
    ) -> Result<(), DirectoryError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| DirectoryError::lock_poisoned("sessions"))?;
        let summary = sessions
            .get_mut(session_id)
            .ok_or_else(|| DirectoryError::session_not_found(session_id))?;
        summary.title = Some(title.to_string());
        Ok(())
    }

    async fn set_working_directory(
        &self,
        session_id: &SessionId,
        working_directory: &Path,
    ) -> Result<(), DirectoryError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| DirectoryError::lock_poisoned("sessions"))?;
        let summary = sessions
            .get_mut(session_id)
            .ok_or_else(|| DirectoryError::session_not_found(session_id))?;
        summary.working_directory = Some(working_directory.to_path_buf());
        Ok(())
    }
}
