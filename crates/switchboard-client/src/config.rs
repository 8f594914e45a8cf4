use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::navigation::DEFAULT_HISTORY_LIMIT;

pub const HISTORY_LIMIT_ENV: &str = "SWITCHBOARD_HISTORY_LIMIT";
pub const PREFETCH_COMMANDS_ENV: &str = "SWITCHBOARD_PREFETCH_COMMANDS";

/// Standardized application directories for Switchboard.
pub struct AppPaths;

impl AppPaths {
    pub fn user_config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "switchboard").map(|d| d.config_dir().to_path_buf())
    }

    pub fn user_data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "switchboard").map(|d| d.data_dir().to_path_buf())
    }

    pub fn client_config() -> Option<PathBuf> {
        Self::user_config_dir().map(|d| d.join("client.toml"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum number of sessions kept in navigation history.
    pub history_limit: usize,
    /// Fetch the slash-command list when the controller goes idle after a switch.
    pub prefetch_commands: bool,
    /// Capacity of the conversation update channel.
    pub update_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            prefetch_commands: true,
            update_buffer: 256,
        }
    }
}

impl ClientConfig {
    /// Load from the user config file and apply environment overrides.
    pub fn load() -> Result<Self> {
        let file = match AppPaths::client_config() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(file.with_overrides(
            std::env::var(HISTORY_LIMIT_ENV).ok().as_deref(),
            std::env::var(PREFETCH_COMMANDS_ENV).ok().as_deref(),
        ))
    }

    /// Missing file yields defaults; an unparseable file is logged and ignored.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse client config at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize client config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn with_overrides(
        mut self,
        history_limit_env: Option<&str>,
        prefetch_env: Option<&str>,
    ) -> Self {
        if let Some(limit) = history_limit_env.and_then(|value| value.trim().parse().ok()) {
            self.history_limit = limit;
        }
        if let Some(enabled) = prefetch_env.and_then(parse_enabled) {
            self.prefetch_commands = enabled;
        }
        self
    }
}

fn parse_enabled(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
