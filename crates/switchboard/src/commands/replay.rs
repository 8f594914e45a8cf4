use async_trait::async_trait;
use eyre::{Result, eyre};
use futures::stream;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use switchboard_client::{
    ClientConfig, DirectorySnapshot, InMemorySessionDirectory, SessionController, SlashCommand,
    Toast,
};
use switchboard_core::{SessionId, SessionState};
use tracing::info;

use super::{Command, read_snapshot};

pub struct ReplayCommand {
    pub events: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub session: Option<String>,
    pub pretty: bool,
    pub config: ClientConfig,
}

/// What the focused conversation looked like after the last replayed frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub revision: u64,
    pub state: SessionState,
    pub toasts: Vec<Toast>,
    pub slash_commands: Vec<SlashCommand>,
    pub history: Vec<SessionId>,
}

#[async_trait]
impl Command for ReplayCommand {
    async fn execute(&self) -> Result<()> {
        let snapshot = match &self.snapshot {
            Some(path) => Some(read_snapshot(path).await?),
            None => None,
        };
        let log = tokio::fs::read_to_string(&self.events)
            .await
            .map_err(|e| eyre!("Failed to read {}: {}", self.events.display(), e))?;

        let report = replay(
            &log,
            snapshot,
            self.session.as_deref().map(SessionId::from),
            self.config.clone(),
        )
        .await?;

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        writeln!(std::io::stdout(), "{rendered}")?;
        Ok(())
    }
}

/// Drives every non-blank line of `log` through a fresh controller.
pub async fn replay(
    log: &str,
    snapshot: Option<DirectorySnapshot>,
    session: Option<SessionId>,
    config: ClientConfig,
) -> Result<ReplayReport> {
    let directory = snapshot.map_or_else(
        InMemorySessionDirectory::new,
        InMemorySessionDirectory::from_snapshot,
    );
    let mut controller = SessionController::new(Arc::new(directory), config);
    controller
        .refresh_sessions()
        .await
        .map_err(|e| eyre!("Failed to list sessions: {}", e))?;

    match &session {
        Some(id) => controller
            .switch_session(id)
            .await
            .map_err(|e| eyre!("Failed to open session {}: {}", id, e))?,
        None => controller.new_chat(),
    }

    let frames: Vec<String> = log
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    info!(target: "switchboard.cli", frames = frames.len(), "Replaying event log");
    controller.drive(stream::iter(frames)).await;
    controller.on_idle().await;

    Ok(ReplayReport {
        revision: controller.revision(),
        state: controller.state().clone(),
        toasts: controller.drain_toasts(),
        slash_commands: controller.slash_commands().to_vec(),
        history: controller.history().iter().cloned().collect(),
    })
}
