//! Errors from the runner itself.
//!
//! Workflow failures are not runner errors: they come back as a FAILED
//! execution result and only change the exit code.

use std::fmt;

#[derive(Debug)]
pub enum RunnerError {
    /// The definition file could not be read.
    ReadDefinition { path: String, reason: String },
    /// Sending was requested but no bot token is configured.
    MissingToken,
    /// The Telegram client could not be built.
    Transport { reason: String },
    /// The result could not be serialized.
    Output { reason: String },
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadDefinition { path, reason } => {
                write!(f, "failed to read definition '{path}': {reason}")
            }
            Self::MissingToken => write!(
                f,
                "no bot token configured (set FLOWBOT__TELEGRAM__TOKEN or use --dry-run)"
            ),
            Self::Transport { reason } => write!(f, "failed to create Telegram client: {reason}"),
            Self::Output { reason } => write!(f, "failed to serialize result: {reason}"),
        }
    }
}

impl std::error::Error for RunnerError {}
