//! Error types for bgpmibd

use thiserror::Error;

/// BGP4-MIB bridge daemon errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// Control channel transport failure (unreachable, timeout, bad exit).
    #[error("Control channel error: {0}")]
    Control(#[from] birdctl::ControlError),

    /// A peer's remote address is missing or not an IPv4 literal.
    #[error("Invalid peer address for '{peer}': {address}")]
    InvalidAddress {
        /// Protocol instance name.
        peer: String,
        /// The rejected address text ("<missing>" when absent).
        address: String,
    },

    /// A single table row could not be built.
    #[error("Failed to build row for peer {index}: {message}")]
    RowBuild {
        /// The row index (remote address).
        index: String,
        /// Error message.
        message: String,
    },

    /// The external responder rejected a registration or push.
    #[error("Responder error: {0}")]
    Responder(String),

    /// Shutdown did not complete within the bounded timeout.
    #[error("Forced shutdown: {0}")]
    ForcedShutdown(String),
}

impl AgentError {
    /// Creates an invalid-address error.
    pub fn invalid_address(peer: impl Into<String>, address: Option<&str>) -> Self {
        Self::InvalidAddress {
            peer: peer.into(),
            address: address.unwrap_or("<missing>").to_string(),
        }
    }
}

/// Result type for bgpmibd operations
pub type AgentResult<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_display() {
        let err = AgentError::invalid_address("peer1", Some("fe80::1"));
        assert_eq!(err.to_string(), "Invalid peer address for 'peer1': fe80::1");
    }

    #[test]
    fn test_invalid_address_missing() {
        let err = AgentError::invalid_address("peer1", None);
        assert!(err.to_string().contains("<missing>"));
    }

    #[test]
    fn test_control_error_converts() {
        let err: AgentError = birdctl::ControlError::command_failed("show status", 1, "gone").into();
        assert!(err.to_string().contains("Control channel error"));
    }
}
