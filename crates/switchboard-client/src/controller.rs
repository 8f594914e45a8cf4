//! Owns the focused conversation and everything needed to switch between
//! sessions without losing background progress.

use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use switchboard_core::reduce::advisory_notice;
use switchboard_core::{
    ActivityStatus, DecodeError, Effect, EventEnvelope, MessageId, ServerEvent, SessionId,
    SessionState, decode_event, hydrate_messages, reduce,
};
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::activity::ActivityTracker;
use crate::cache::SessionCache;
use crate::commands::CommandCache;
use crate::config::ClientConfig;
use crate::directory::{SessionDirectory, SessionSummary, SlashCommand};
use crate::dispatcher::{EventDispatcher, Focus, Route};
use crate::error::{Error, Result};
use crate::navigation::NavigationHistory;
use crate::notifications::{Toast, ToastQueue};
use crate::shortcuts::{NavigationCommand, ShortcutOutcome, match_shortcut};
use crate::usage::{ContextUsageMap, ContextUsageSnapshot};

/// Published after every processed event.
#[derive(Debug, Clone)]
pub struct ConversationUpdate {
    pub revision: u64,
    pub session_id: Option<SessionId>,
    pub state: Arc<SessionState>,
}

pub struct SessionController {
    directory: Arc<dyn SessionDirectory>,
    config: ClientConfig,
    dispatcher: EventDispatcher,
    state: SessionState,
    awaiting_new_session: bool,
    sessions: Vec<SessionSummary>,
    cache: SessionCache,
    commands: CommandCache,
    activity: ActivityTracker,
    usage: ContextUsageMap,
    history: NavigationHistory,
    toasts: ToastQueue,
    location_fragment: Option<String>,
    pending_command_dir: Option<PathBuf>,
    slash_commands: Vec<SlashCommand>,
    revision: u64,
    updates: broadcast::Sender<ConversationUpdate>,
}

impl SessionController {
    pub fn new(directory: Arc<dyn SessionDirectory>, config: ClientConfig) -> Self {
        let (updates, _) = broadcast::channel(config.update_buffer.max(1));
        Self {
            directory,
            dispatcher: EventDispatcher::new(),
            state: SessionState::default(),
            awaiting_new_session: false,
            sessions: Vec::new(),
            cache: SessionCache::new(),
            commands: CommandCache::new(),
            activity: ActivityTracker::new(),
            usage: ContextUsageMap::default(),
            history: NavigationHistory::with_limit(config.history_limit),
            toasts: ToastQueue::default(),
            location_fragment: None,
            pending_command_dir: None,
            slash_commands: Vec::new(),
            revision: 0,
            updates,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationUpdate> {
        self.updates.subscribe()
    }

    /// Consume an event stream strictly in order; each event is applied and
    /// published before the next one is read.
    pub async fn drive<S>(&mut self, stream: S)
    where
        S: Stream<Item = String>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(raw) = stream.next().await {
            self.handle_raw(&raw);
        }
    }

    /// Decode and handle one raw frame. Undecodable frames are ignored.
    pub fn handle_raw(&mut self, raw: &str) {
        match decode_event(raw) {
            Ok(envelope) => self.handle_event(envelope),
            Err(DecodeError::UnknownType(kind)) => {
                trace!(target: "switchboard.dispatch", %kind, "ignoring unknown event type");
            }
            Err(err) => {
                debug!(target: "switchboard.dispatch", error = %err, "ignoring malformed event");
            }
        }
    }

    pub fn handle_event(&mut self, envelope: EventEnvelope) {
        self.handle_event_at(envelope, Utc::now());
    }

    pub fn handle_event_at(&mut self, envelope: EventEnvelope, now: DateTime<Utc>) {
        let mut route = self.dispatcher.route(&envelope, self.focus());
        // Sessions this controller has already seen never belong to the new chat.
        if matches!(&route, Route::Adopt(session_id) if self.is_known_session(session_id)) {
            route = self.dispatcher.route(&envelope, Focus::Idle);
        }

        match route {
            Route::Apply => self.apply(&envelope.event, now),
            Route::Adopt(session_id) => {
                info!(target: "switchboard.controller", session_id = %session_id, "new chat assigned a session");
                self.awaiting_new_session = false;
                self.location_fragment = Some(session_id.to_string());
                self.sessions.insert(
                    0,
                    SessionSummary {
                        id: session_id.clone(),
                        title: self.state.title.clone(),
                        mode: self.state.mode.clone(),
                        permission_mode: self.state.permission_mode.clone(),
                        working_directory: None,
                        updated_at: now,
                    },
                );
                self.state.session_id = Some(session_id);
                self.apply(&envelope.event, now);
            }
            Route::ContextUsage(session_id) => {
                if let Some(snapshot) = ContextUsageSnapshot::from_event(&envelope.event) {
                    self.usage.update(session_id, snapshot);
                }
            }
            Route::Advisory => {
                if let Some(effect) = advisory_notice(&envelope.event) {
                    self.interpret(effect, now);
                }
            }
            Route::BackgroundTerminal(session_id) => {
                let status = match envelope.event {
                    ServerEvent::Error { .. } => ActivityStatus::Error,
                    _ => ActivityStatus::Completed,
                };
                debug!(
                    target: "switchboard.controller",
                    session_id = %session_id,
                    %status,
                    "background session finished"
                );
                self.activity.finish(&session_id, status);
                self.cache.evict(&session_id);
            }
            Route::Drop => return,
        }

        self.publish();
    }

    fn apply(&mut self, event: &ServerEvent, now: DateTime<Utc>) {
        let effects = reduce(&mut self.state, event, now);
        if let Some(session_id) = &self.state.session_id {
            self.activity
                .record(session_id, self.state.loading, &self.state.activity);
        }
        for effect in effects {
            self.interpret(effect, now);
        }
    }

    fn interpret(&mut self, effect: Effect, now: DateTime<Utc>) {
        match effect {
            Effect::Notify { level, message } => self.toasts.push(Toast {
                level,
                message,
                session_id: self.state.session_id.clone(),
                created_at: now,
            }),
            Effect::TurnFinalized {
                session_id,
                outcome,
            } => {
                debug!(target: "switchboard.controller", ?session_id, %outcome, "turn finalized");
                if let Some(session_id) = session_id {
                    self.cache.evict(&session_id);
                }
            }
            Effect::ModeChanged { mode } => {
                if let Some(summary) = self.current_summary_mut() {
                    summary.mode = Some(mode);
                }
            }
            Effect::PermissionModeChanged { mode } => {
                if let Some(summary) = self.current_summary_mut() {
                    summary.permission_mode = Some(mode);
                }
            }
            Effect::TitleUpdated { session_id, title } => {
                if let Some(summary) = self.sessions.iter_mut().find(|s| s.id == session_id) {
                    summary.title = Some(title);
                }
            }
            Effect::PlanReady { .. } => {
                debug!(target: "switchboard.controller", "plan ready for review");
            }
            Effect::QuestionAsked { tool_id } => {
                debug!(target: "switchboard.controller", %tool_id, "agent is waiting on an answer");
            }
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        if self.updates.receiver_count() == 0 {
            return;
        }
        let update = ConversationUpdate {
            revision: self.revision,
            session_id: self.state.session_id.clone(),
            state: Arc::new(self.state.clone()),
        };
        if self.updates.send(update).is_err() {
            trace!(target: "switchboard.controller", "no update subscribers");
        }
    }

    fn focus(&self) -> Focus<'_> {
        match &self.state.session_id {
            Some(session_id) => Focus::Session(session_id),
            None if self.awaiting_new_session => Focus::AwaitingNewSession,
            None => Focus::Idle,
        }
    }

    /// Append the user's prompt to the focused conversation. Without a
    /// session the next session-tagged event becomes this chat's session.
    pub fn submit_prompt(&mut self, text: impl Into<String>) -> MessageId {
        if self.state.session_id.is_none() {
            self.awaiting_new_session = true;
        }
        let id = self.state.push_user_message(text, Utc::now()).id.clone();
        if let Some(session_id) = &self.state.session_id {
            self.activity
                .record(session_id, self.state.loading, &self.state.activity);
        }
        self.publish();
        id
    }

    pub fn new_chat(&mut self) {
        self.leave_current();
        self.state = SessionState::default();
        self.awaiting_new_session = true;
        self.location_fragment = None;
        self.pending_command_dir = None;
        self.slash_commands.clear();
        self.publish();
    }

    /// Show `target`, restoring it from the cache when possible.
    ///
    /// On a fetch failure the focused conversation is unchanged and the error
    /// is returned. A session the directory no longer knows is forgotten.
    pub async fn switch_session(&mut self, target: &SessionId) -> Result<()> {
        if self.state.session_id.as_ref() == Some(target) {
            return Ok(());
        }

        let messages = match self.cache.take(target) {
            Some(messages) => {
                debug!(target: "switchboard.cache", session_id = %target, "restored session from cache");
                messages
            }
            None => {
                let rows = match self.directory.fetch_session_messages(target).await {
                    Ok(rows) => rows,
                    Err(err) => {
                        let err = Error::from(err);
                        if err.is_session_not_found() {
                            self.forget_session(target);
                        }
                        return Err(err);
                    }
                };
                debug!(
                    target: "switchboard.directory",
                    session_id = %target,
                    rows = rows.len(),
                    "fetched session messages"
                );
                hydrate_messages(&rows)
            }
        };

        self.leave_current();

        let mut state = SessionState::with_messages(target.clone(), messages);
        if let Some(entry) = self.activity.get(target) {
            state.loading = entry.loading;
            state.activity = entry.activity.clone();
        }
        let summary = self.summary(target).cloned();
        if let Some(summary) = &summary {
            state.mode.clone_from(&summary.mode);
            state.permission_mode.clone_from(&summary.permission_mode);
            state.title.clone_from(&summary.title);
        }

        self.state = state;
        self.awaiting_new_session = false;
        self.location_fragment = Some(target.to_string());
        self.pending_command_dir = summary.and_then(|summary| summary.working_directory);
        self.slash_commands.clear();

        info!(target: "switchboard.controller", session_id = %target, "switched session");
        self.publish();
        Ok(())
    }

    /// Record the focused session in history and keep its messages if a turn
    /// is still streaming.
    fn leave_current(&mut self) {
        let Some(current) = self.state.session_id.clone() else {
            return;
        };
        self.history.push(current.clone());
        self.activity
            .record(&current, self.state.loading, &self.state.activity);
        if self.state.loading {
            self.cache
                .store(current, std::mem::take(&mut self.state.messages));
        }
    }

    /// Move to the next more recent session in the list.
    pub async fn prev_chat(&mut self) -> Result<()> {
        let Some(index) = self.current_index() else {
            return Ok(());
        };
        match index.checked_sub(1).and_then(|i| self.sessions.get(i)) {
            Some(summary) => {
                let target = summary.id.clone();
                self.switch_session(&target).await
            }
            None => Ok(()),
        }
    }

    /// Move to the next older session in the list, or the most recent one when
    /// nothing listed is focused.
    pub async fn next_chat(&mut self) -> Result<()> {
        let next = self.current_index().map_or(0, |index| index + 1);
        match self.sessions.get(next) {
            Some(summary) => {
                let target = summary.id.clone();
                self.switch_session(&target).await
            }
            None => Ok(()),
        }
    }

    pub async fn back_to_recent(&mut self) -> Result<()> {
        while let Some(previous) = self.history.pop() {
            if self.state.session_id.as_ref() == Some(&previous) {
                continue;
            }
            let result = self.switch_session(&previous).await;
            if result.as_ref().is_err_and(|err| !err.is_session_not_found()) {
                self.history.push(previous);
            }
            return result;
        }
        Ok(())
    }

    pub async fn run_navigation(&mut self, command: NavigationCommand) -> Result<()> {
        match command {
            NavigationCommand::PrevChat => self.prev_chat().await,
            NavigationCommand::NextChat => self.next_chat().await,
            NavigationCommand::BackToRecent => self.back_to_recent().await,
        }
    }

    pub async fn handle_shortcut(&mut self, key: &KeyEvent) -> Result<Option<ShortcutOutcome>> {
        let Some(outcome) = match_shortcut(key) else {
            return Ok(None);
        };
        self.run_navigation(outcome.command).await?;
        Ok(Some(outcome))
    }

    /// Deferred work after a switch; currently the slash-command prefetch.
    pub async fn on_idle(&mut self) {
        if self.config.prefetch_commands && self.pending_command_dir.is_some() {
            self.load_slash_commands().await;
        }
    }

    pub async fn load_slash_commands(&mut self) -> &[SlashCommand] {
        let working_directory = self.pending_command_dir.take().or_else(|| {
            self.current_summary()
                .and_then(|summary| summary.working_directory.clone())
        });
        if let Some(working_directory) = working_directory {
            self.slash_commands = self
                .commands
                .get_or_fetch(self.directory.as_ref(), &working_directory)
                .await;
        }
        &self.slash_commands
    }

    pub async fn refresh_sessions(&mut self) -> Result<()> {
        self.sessions = self.directory.list_sessions().await?;
        debug!(target: "switchboard.directory", count = self.sessions.len(), "refreshed session list");
        Ok(())
    }

    pub async fn rename_session(&mut self, session_id: &SessionId, title: &str) -> Result<()> {
        self.directory.rename_session(session_id, title).await?;
        if self.state.session_id.as_ref() == Some(session_id) {
            self.state.title = Some(title.to_string());
        }
        self.refresh_sessions().await
    }

    pub async fn set_working_directory(
        &mut self,
        session_id: &SessionId,
        working_directory: &Path,
    ) -> Result<()> {
        let previous = self
            .summary(session_id)
            .and_then(|summary| summary.working_directory.clone());

        self.directory
            .set_working_directory(session_id, working_directory)
            .await?;

        if let Some(previous) = previous {
            self.commands.invalidate(&previous).await;
        }
        self.commands.invalidate(working_directory).await;

        if self.state.session_id.as_ref() == Some(session_id) {
            self.pending_command_dir = Some(working_directory.to_path_buf());
            self.slash_commands.clear();
        }
        self.refresh_sessions().await
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.toasts.drain()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.state.session_id.as_ref()
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn usage(&self) -> &ContextUsageMap {
        &self.usage
    }

    pub fn slash_commands(&self) -> &[SlashCommand] {
        &self.slash_commands
    }

    pub fn location_fragment(&self) -> Option<&str> {
        self.location_fragment.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_awaiting_new_session(&self) -> bool {
        self.awaiting_new_session
    }

    fn is_known_session(&self, session_id: &SessionId) -> bool {
        self.summary(session_id).is_some()
            || self.cache.contains(session_id)
            || self.activity.get(session_id).is_some()
            || self.history.iter().any(|entry| entry == session_id)
    }

    fn forget_session(&mut self, session_id: &SessionId) {
        debug!(target: "switchboard.controller", session_id = %session_id, "forgetting missing session");
        self.history.remove(session_id);
        self.activity.forget(session_id);
        self.usage.remove(session_id);
        self.cache.evict(session_id);
        self.sessions.retain(|summary| &summary.id != session_id);
    }

    fn summary(&self, session_id: &SessionId) -> Option<&SessionSummary> {
        self.sessions.iter().find(|summary| &summary.id == session_id)
    }

    fn current_summary(&self) -> Option<&SessionSummary> {
        self.state
            .session_id
            .as_ref()
            .and_then(|session_id| self.summary(session_id))
    }

    fn current_summary_mut(&mut self) -> Option<&mut SessionSummary> {
        let session_id = self.state.session_id.as_ref()?;
        self.sessions
            .iter_mut()
            .find(|summary| &summary.id == session_id)
    }

    fn current_index(&self) -> Option<usize> {
        let session_id = self.state.session_id.as_ref()?;
        self.sessions
            .iter()
            .position(|summary| &summary.id == session_id)
    }
}
