use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::directory::{SessionDirectory, SlashCommand};

/// Slash commands per working directory, independent of the message cache.
#[derive(Clone, Debug, Default)]
pub struct CommandCache {
    entries: Arc<RwLock<HashMap<PathBuf, Vec<SlashCommand>>>>,
}

impl CommandCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached commands for `working_directory`, fetching them on a miss.
    ///
    /// A failed fetch is logged and yields an empty list that is not cached,
    /// so the next call retries.
    pub async fn get_or_fetch(
        &self,
        directory: &dyn SessionDirectory,
        working_directory: &Path,
    ) -> Vec<SlashCommand> {
        if let Some(commands) = self.get(working_directory).await {
            return commands;
        }

        match directory.list_slash_commands(working_directory).await {
            Ok(commands) => {
                debug!(
                    target: "switchboard.cache",
                    directory = %working_directory.display(),
                    count = commands.len(),
                    "cached slash commands"
                );
                self.entries
                    .write()
                    .await
                    .insert(working_directory.to_path_buf(), commands.clone());
                commands
            }
            Err(err) => {
                warn!(
                    target: "switchboard.directory",
                    directory = %working_directory.display(),
                    error = %err,
                    "failed to list slash commands"
                );
                Vec::new()
            }
        }
    }

    pub async fn get(&self, working_directory: &Path) -> Option<Vec<SlashCommand>> {
        self.entries.read().await.get(working_directory).cloned()
    }

    pub async fn invalidate(&self, working_directory: &Path) {
        self.entries.write().await.remove(working_directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemorySessionDirectory;

    fn command(name: &str) -> SlashCommand {
        SlashCommand {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let directory = InMemorySessionDirectory::new();
        let path = Path::new("/work/app");
        directory.put_commands(path, vec![command("review")]).unwrap();
        let cache = CommandCache::new();

        assert_eq!(cache.get_or_fetch(&directory, path).await.len(), 1);
        assert_eq!(cache.get_or_fetch(&directory, path).await.len(), 1);
        assert_eq!(directory.command_fetch_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let directory = InMemorySessionDirectory::new();
        let path = Path::new("/work/app");
        directory.put_commands(path, vec![command("review")]).unwrap();
        directory.fail_command_listing(true);
        let cache = CommandCache::new();

        assert!(cache.get_or_fetch(&directory, path).await.is_empty());
        assert!(cache.get(path).await.is_none());

        directory.fail_command_listing(false);
        assert_eq!(cache.get_or_fetch(&directory, path).await.len(), 1);
        assert_eq!(directory.command_fetch_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let directory = InMemorySessionDirectory::new();
        let path = Path::new("/work/app");
        let cache = CommandCache::new();

        cache.get_or_fetch(&directory, path).await;
        cache.invalidate(path).await;
        cache.get_or_fetch(&directory, path).await;
        assert_eq!(directory.command_fetch_count(), 2);
    }
}
