//! Management-protocol responder boundary.
//!
//! The AgentX master session (registration handshake, PDU framing, agent
//! lifecycle) is an external collaborator: the core only needs a "register
//! subtree, push bindings, fail with a transport error on I/O problems"
//! capability, which [`MibResponder`] captures. The daemon ships with
//! [`WalkResponder`], which renders every binding set in snmpwalk notation
//! through tracing; a real subagent session implements the same trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::AgentResult;
use crate::mib::{Oid, VarBind};

/// Registration and publication surface toward the management protocol.
#[async_trait]
pub trait MibResponder: Send {
    /// Registers the subtree this daemon answers for.
    async fn register(&mut self, root: &Oid) -> AgentResult<()>;

    /// Pushes a freshly built binding set to the responder.
    async fn publish(&mut self, bindings: &[VarBind]) -> AgentResult<()>;

    /// Tears down the registration.
    async fn close(&mut self) -> AgentResult<()>;
}

/// Renders one binding in snmpwalk notation.
pub fn format_binding(binding: &VarBind) -> String {
    format!("{} = {}", binding.oid, binding.value)
}

/// Responder that logs the MIB view instead of speaking to a master agent.
#[derive(Debug, Default)]
pub struct WalkResponder {
    registered: Option<Oid>,
}

impl WalkResponder {
    /// Creates an unregistered walk responder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The subtree registered so far, if any.
    pub fn registered(&self) -> Option<&Oid> {
        self.registered.as_ref()
    }
}

#[async_trait]
impl MibResponder for WalkResponder {
    async fn register(&mut self, root: &Oid) -> AgentResult<()> {
        info!(subtree = %root, "Registered MIB subtree");
        self.registered = Some(root.clone());
        Ok(())
    }

    async fn publish(&mut self, bindings: &[VarBind]) -> AgentResult<()> {
        debug!(count = bindings.len(), "Publishing binding set");
        for binding in bindings {
            debug!("{}", format_binding(binding));
        }
        Ok(())
    }

    async fn close(&mut self) -> AgentResult<()> {
        if let Some(root) = self.registered.take() {
            info!(subtree = %root, "Unregistered MIB subtree");
        }
        Ok(())
    }
}
