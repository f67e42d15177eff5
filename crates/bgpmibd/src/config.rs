//! Daemon configuration.
//!
//! Configuration comes from environment variables with built-in defaults.
//! A malformed value is a recoverable condition: it logs a warning and the
//! default applies, so a bad setting never keeps the daemon from serving.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::collector::DEFAULT_REFRESH_SECS;

/// Built-in fallback local AS when BIRD output never reports one.
pub const DEFAULT_LOCAL_AS: u32 = 65000;

/// Default per-command control channel timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 5;

/// Default AgentX master endpoint.
pub const DEFAULT_AGENTX_SOCKET: &str = "tcp:localhost:705";

/// Runtime configuration for the bridge daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Path to the birdc binary.
    pub birdc_path: PathBuf,
    /// BIRD control socket (`birdc -s`), when not the compiled-in default.
    pub bird_socket: Option<PathBuf>,
    /// Fallback local AS number.
    pub local_as_default: u32,
    /// Collection interval.
    pub refresh_interval: Duration,
    /// Per-command control channel timeout.
    pub command_timeout: Duration,
    /// AgentX master endpoint handed to the responder.
    pub agentx_socket: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            birdc_path: PathBuf::from("birdc"),
            bird_socket: None,
            local_as_default: DEFAULT_LOCAL_AS,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            agentx_socket: DEFAULT_AGENTX_SOCKET.to_string(),
        }
    }
}

impl AgentConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            birdc_path: lookup("BIRDC_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.birdc_path),
            bird_socket: lookup("BIRD_SOCKET").map(PathBuf::from),
            local_as_default: parse_or(
                "BGP_LOCAL_AS_DEFAULT",
                lookup("BGP_LOCAL_AS_DEFAULT"),
                defaults.local_as_default,
            ),
            refresh_interval: Duration::from_secs(parse_or(
                "REFRESH_INTERVAL_SECS",
                lookup("REFRESH_INTERVAL_SECS"),
                DEFAULT_REFRESH_SECS,
            )),
            command_timeout: Duration::from_secs(parse_or(
                "BIRDC_TIMEOUT_SECS",
                lookup("BIRDC_TIMEOUT_SECS"),
                DEFAULT_COMMAND_TIMEOUT_SECS,
            )),
            agentx_socket: lookup("AGENTX_SOCKET").unwrap_or(defaults.agentx_socket),
        }
    }
}

/// Parses a variable's value, falling back to the default on a bad value.
fn parse_or<T: FromStr + Copy>(name: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "Malformed configuration value, using default");
            default
        }),
    }
}
