use async_trait::async_trait;
use eyre::{Result, eyre};
use std::path::Path;
use switchboard_client::DirectorySnapshot;

pub mod replay;
pub mod sessions;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

pub(crate) async fn read_snapshot(path: &Path) -> Result<DirectorySnapshot> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| eyre!("Failed to read snapshot {}: {}", path.display(), e))?;
    serde_json::from_str(&raw)
        .map_err(|e| eyre!("Failed to parse snapshot {}: {}", path.display(), e))
}
