//! Error types for unholy-core

/// Result type for unholy-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while orchestrating a development environment
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] unholy_config::Error),

    #[error(transparent)]
    Platform(#[from] unholy_platform::Error),

    #[error(transparent)]
    Git(#[from] unholy_git::Error),

    /// An internal get-then-assert failed; never a plain "absent"
    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },

    /// A process run inside a container exited unsuccessfully
    #[error("`{command}` exited with status {exit_code}")]
    ProcessFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// An injected bootstrap script exited unsuccessfully
    #[error("Script {index} (from {layer}) exited with status {exit_code}")]
    ScriptFailed {
        index: usize,
        layer: String,
        exit_code: i32,
    },

    #[error("{path} not found in container {container}")]
    FileNotFound { container: String, path: String },

    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },

    #[error("Project '{name}' does not exist")]
    UnknownProject { name: String },

    #[error("Project '{project}' has no devenv; run `unholy remake {project}`")]
    NoDevenv { project: String },

    #[error("Aborted")]
    Aborted,
}

impl Error {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Exit code of the failed process, for errors that carry one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessFailed { exit_code, .. } | Self::ScriptFailed { exit_code, .. } => {
                Some(*exit_code)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound { .. } => true,
            Self::Config(e) => e.is_not_found(),
            Self::Platform(e) => e.is_not_found(),
            Self::Git(e) => e.is_not_found(),
            _ => false,
        }
    }
}
