//! Control channel command execution.
//!
//! [`BirdcClient`] shells out to the `birdc` utility, which speaks BIRD's
//! interactive protocol over its control socket. The client issues exactly
//! one command per call, bounded by a timeout, and performs no retries:
//! retry policy belongs to the collection layer.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ControlError, ControlResult};

/// Read-only command access to a routing daemon's control channel.
///
/// The single seam between the collection layer and the daemon. Test code
/// substitutes a scripted fake; production uses [`BirdcClient`].
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Issues one command and returns its raw text output.
    async fn send(&self, command: &str) -> ControlResult<String>;
}

/// Control client backed by the `birdc` command-line utility.
#[derive(Debug, Clone)]
pub struct BirdcClient {
    /// Path to the birdc binary.
    birdc_path: PathBuf,
    /// Optional control socket path (`birdc -s <socket>`).
    socket: Option<PathBuf>,
    /// Per-command timeout.
    timeout: Duration,
}

impl BirdcClient {
    /// Creates a client for the given birdc binary and optional socket.
    pub fn new(
        birdc_path: impl Into<PathBuf>,
        socket: Option<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            birdc_path: birdc_path.into(),
            socket,
            timeout,
        }
    }

    fn build_command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.birdc_path);
        if let Some(socket) = &self.socket {
            cmd.arg("-s").arg(socket);
        }
        // birdc takes the control command as trailing arguments
        cmd.args(command.split_whitespace());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl ControlChannel for BirdcClient {
    async fn send(&self, command: &str) -> ControlResult<String> {
        tracing::debug!(command = %command, "Issuing control command");

        let output = tokio::time::timeout(self.timeout, self.build_command(command).output())
            .await
            .map_err(|_| ControlError::Timeout {
                command: command.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ControlError::Spawn {
                command: command.to_string(),
                source: e,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if exit_code != 0 {
            tracing::warn!(
                command = %command,
                exit_code = exit_code,
                stderr = %stderr,
                "Control command failed"
            );
            let output = if stderr.is_empty() {
                stdout.trim().to_string()
            } else {
                stderr
            };
            return Err(ControlError::command_failed(command, exit_code, output));
        }

        tracing::trace!(command = %command, bytes = stdout.len(), "Control command succeeded");
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Stand-in binaries exercise the transport path without a running
    // BIRD instance; the control command becomes their arguments.

    #[tokio::test]
    async fn test_send_captures_stdout() {
        let client = BirdcClient::new("/bin/echo", None, Duration::from_secs(5));
        let out = client.send("show status").await.unwrap();
        assert_eq!(out.trim(), "show status");
    }

    #[tokio::test]
    async fn test_send_nonzero_exit_is_command_failed() {
        let client = BirdcClient::new("/bin/false", None, Duration::from_secs(5));
        let err = client.send("show status").await.unwrap_err();
        match err {
            ControlError::CommandFailed { exit_code, .. } => assert_eq!(exit_code, 1),
            other => panic!("Expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_missing_binary_is_spawn_error() {
        let client = BirdcClient::new(
            "/nonexistent/birdc",
            None,
            Duration::from_secs(5),
        );
        let err = client.send("show status").await.unwrap_err();
        assert!(matches!(err, ControlError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_send_times_out() {
        let client = BirdcClient::new("/bin/sleep", None, Duration::from_millis(100));
        let err = client.send("5").await.unwrap_err();
        assert!(matches!(err, ControlError::Timeout { .. }));
    }

    #[test]
    fn test_build_command_includes_socket() {
        let client = BirdcClient::new(
            "/usr/sbin/birdc",
            Some(PathBuf::from("/run/bird/bird.ctl")),
            Duration::from_secs(5),
        );
        let cmd = client.build_command("show protocols all peer1");
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec!["-s", "/run/bird/bird.ctl", "show", "protocols", "all", "peer1"]
        );
    }
}
