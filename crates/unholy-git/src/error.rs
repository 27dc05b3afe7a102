//! Error types for unholy-git

use std::path::PathBuf;

/// Result type for unholy-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching from a remote repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `git` exited unsuccessfully or could not be started
    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{path}' not found in {repository}")]
    FileNotFound { repository: String, path: String },

    #[error("Malformed archive from {repository}: {message}")]
    Archive { repository: String, message: String },

    #[error("Cannot derive a project name from '{url}'")]
    InvalidUrl { url: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}
