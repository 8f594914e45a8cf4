use async_trait::async_trait;
use chrono::Local;
use eyre::{Result, eyre};
use std::io::Write;
use std::path::PathBuf;
use switchboard_client::{InMemorySessionDirectory, SessionDirectory};

use super::{Command, read_snapshot};

pub struct SessionsCommand {
    pub snapshot: PathBuf,
}

#[async_trait]
impl Command for SessionsCommand {
    async fn execute(&self) -> Result<()> {
        let directory = InMemorySessionDirectory::from_snapshot(read_snapshot(&self.snapshot).await?);
        let sessions = directory
            .list_sessions()
            .await
            .map_err(|e| eyre!("Failed to list sessions: {}", e))?;

        let mut stdout = std::io::stdout();
        if sessions.is_empty() {
            writeln!(stdout, "No sessions found.")?;
            return Ok(());
        }

        writeln!(stdout, "Sessions:")?;
        writeln!(
            stdout,
            "{:<36} {:<20} {:<12} {:<30} {:<30}",
            "ID", "Updated", "Mode", "Title", "Directory"
        )?;
        writeln!(stdout, "{}", "-".repeat(132))?;

        for session in sessions {
            let updated = session
                .updated_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            let mode = session.mode.unwrap_or_else(|| "N/A".to_string());
            let title = session.title.unwrap_or_else(|| "N/A".to_string());
            let dir = session
                .working_directory
                .map_or_else(|| "N/A".to_string(), |p| p.display().to_string());
            writeln!(
                stdout,
                "{:<36} {:<20} {:<12} {:<30} {:<30}",
                session.id.as_str(),
                updated,
                mode,
                title,
                dir
            )?;
        }

        Ok(())
    }
}
