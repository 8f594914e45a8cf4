use thiserror::Error;

use crate::directory::DirectoryError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn is_session_not_found(&self) -> bool {
        matches!(
            self,
            Self::Directory(DirectoryError::SessionNotFound { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
