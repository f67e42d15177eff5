//! # bgpmibd - BGP4-MIB bridge daemon
//!
//! This daemon bridges the BIRD routing daemon's text control protocol to
//! the standard BGP4-MIB (1.3.6.1.2.1.15), so generic SNMP tooling can
//! poll BGP peering status without native instrumentation in BIRD.
//!
//! ## Responsibilities
//! - Collect peering state from BIRD on a fixed interval (control channel
//!   and parsing via the [`birdctl`] crate)
//! - Hold exactly one consistent point-in-time [`Snapshot`](snapshot::Snapshot)
//!   under single-writer/many-reader semantics
//! - Translate the current snapshot into correctly-indexed, correctly-typed
//!   variable bindings on every poll
//!
//! ## Architecture
//!
//! Two independent schedules share nothing but the snapshot cache:
//!
//! ```text
//! Collector loop:  timer -> ControlChannel -> parse -> SnapshotCache (write)
//! Poll path:       responder -> MibMapper -> SnapshotCache (read)
//! ```
//!
//! A failed collection cycle leaves the previous snapshot in place; the
//! poll path never performs daemon I/O, so polling cost is independent of
//! BIRD latency. No condition in this core is fatal to the process.

pub mod cache;
pub mod collector;
pub mod config;
pub mod error;
pub mod mib;
pub mod responder;
pub mod snapshot;
pub mod source;

pub use cache::SnapshotCache;
pub use collector::Collector;
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use mib::{MibMapper, Oid, Value, VarBind};
pub use responder::{MibResponder, WalkResponder};
pub use snapshot::{BgpState, PeerRecord, Snapshot};
pub use source::{BirdSource, SnapshotSource};
