//! Error types for control channel operations.
//!
//! All errors implement `std::error::Error` via `thiserror`. These cover
//! transport failures only; a field missing from BIRD's output is not an
//! error (see [`crate::parse`]).

use std::io;
use thiserror::Error;

/// Result type alias for control channel operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors raised while talking to the BIRD control channel.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The birdc process could not be spawned.
    #[error("Failed to execute control command '{command}': {source}")]
    Spawn {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The control command did not complete within the configured timeout.
    #[error("Control command '{command}' timed out after {timeout_secs}s")]
    Timeout {
        /// The command that timed out.
        command: String,
        /// The timeout that was exceeded, in seconds.
        timeout_secs: u64,
    },

    /// birdc exited with a non-zero status.
    #[error("Control command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },
}

impl ControlError {
    /// Creates a command-failed error.
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }
}
