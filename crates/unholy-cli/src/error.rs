//! Error types for unholy-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] unholy_core::Error),

    #[error(transparent)]
    Config(#[from] unholy_config::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A host process launched by a command failed
    #[error("`{command}` exited with status {code}")]
    Process { command: String, code: i32 },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Exit code for the process: the failed process's own code when there
    /// is one, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(e) => e.exit_code().unwrap_or(1),
            Self::Process { code, .. } => *code,
            _ => 1,
        }
    }

    /// Captured output and the failing command line, for process failures.
    pub fn process_details(&self) -> Option<(&str, &str)> {
        match self {
            Self::Core(unholy_core::Error::ProcessFailed {
                command, output, ..
            }) => Some((command.as_str(), output.as_str())),
            _ => None,
        }
    }
}
