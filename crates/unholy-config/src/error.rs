//! Error types for unholy-config

use std::path::PathBuf;

/// Result type for unholy-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, editing, or resolving Unholyfiles
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not exist and creation was not requested
    #[error("Unholyfile not found at {path}")]
    FileNotFound { path: PathBuf },

    /// Malformed TOML headmatter in one of the configuration layers
    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Configuration key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Configuration key '{key}' is {found}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// True for the not-found family: missing file or missing key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. } | Self::KeyNotFound { .. })
    }
}
