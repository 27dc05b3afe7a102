//! Error types for unholy-platform

use std::path::PathBuf;

/// Result type for unholy-platform operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a container platform
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform client could not be started at all
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A platform call was rejected
    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// The named resource (or a path inside a container) does not exist
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The resource is already being torn down
    #[error("{kind} is already being removed: {name}")]
    RemovalInProgress { kind: &'static str, name: String },

    #[error("Malformed platform response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {message}")]
    Archive { message: String },
}

impl Error {
    pub fn archive(message: impl ToString) -> Self {
        Self::Archive {
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the resource no longer exists or is on its way out.
    ///
    /// Cleanup treats these as success.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::RemovalInProgress { .. })
    }
}
