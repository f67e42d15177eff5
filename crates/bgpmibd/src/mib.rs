//! BGP4-MIB variable binding construction.
//!
//! Translates the current snapshot into the BGP4-MIB subtree rooted at
//! 1.3.6.1.2.1.15: three scalars (bgpVersion, bgpLocalAs, bgpIdentifier)
//! and the bgpPeerTable indexed by bgpPeerRemoteAddr. The mapper reads
//! only the snapshot cache; it never touches the control channel, so
//! polling cost is independent of daemon latency.
//!
//! Table instance OIDs follow RFC 4273: the peer's remote address is
//! appended to each column OID as four dotted-decimal sub-identifiers,
//! and the bgpPeerRemoteAddr column's own value equals that index.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::warn;

use crate::cache::SnapshotCache;
use crate::error::{AgentError, AgentResult};
use crate::snapshot::PeerRecord;

/// Base of the BGP4-MIB subtree: .1.3.6.1.2.1.15
const BGP4_BASE: &[u32] = &[1, 3, 6, 1, 2, 1, 15];

/// bgpPeerEntry relative to the base: bgpPeerTable(3).bgpPeerEntry(1)
const PEER_ENTRY: &[u32] = &[3, 1];

/// bgpPeerEntry column numbers (RFC 4273).
mod col {
    pub const PEER_IDENTIFIER: u32 = 1;
    pub const PEER_STATE: u32 = 2;
    pub const PEER_ADMIN_STATUS: u32 = 3;
    pub const REMOTE_ADDR: u32 = 7;
    pub const REMOTE_AS: u32 = 9;
    pub const IN_UPDATES: u32 = 10;
    pub const OUT_UPDATES: u32 = 11;
    pub const LAST_ERROR: u32 = 14;
}

/// bgpPeerAdminStatus stop(1).
const ADMIN_STOP: i32 = 1;
/// bgpPeerAdminStatus start(2).
const ADMIN_START: i32 = 2;

/// An object identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(pub Vec<u32>);

impl Oid {
    /// Creates an OID from a sub-identifier slice.
    pub fn from_slice(parts: &[u32]) -> Self {
        Oid(parts.to_vec())
    }

    /// Returns this OID extended with the given sub-identifiers.
    pub fn extended(&self, parts: &[u32]) -> Self {
        let mut v = self.0.clone();
        v.extend_from_slice(parts);
        Oid(v)
    }

    /// Returns this OID with an IPv4 address appended as four
    /// dotted-decimal sub-identifiers (the IpAddress index encoding).
    pub fn with_ipv4_index(&self, addr: Ipv4Addr) -> Self {
        let octets = addr.octets();
        self.extended(&[
            octets[0] as u32,
            octets[1] as u32,
            octets[2] as u32,
            octets[3] as u32,
        ])
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.0 {
            write!(f, ".{part}")?;
        }
        Ok(())
    }
}

/// Root of the BGP4-MIB subtree, used for registration.
pub fn bgp4_root() -> Oid {
    Oid::from_slice(BGP4_BASE)
}

/// bgpVersion.0
fn bgp_version() -> Oid {
    bgp4_root().extended(&[1, 0])
}

/// bgpLocalAs.0
fn bgp_local_as() -> Oid {
    bgp4_root().extended(&[2, 0])
}

/// bgpIdentifier.0
fn bgp_identifier() -> Oid {
    bgp4_root().extended(&[3, 0])
}

/// A bgpPeerEntry column OID, without its index.
fn peer_column(column: u32) -> Oid {
    let mut v = BGP4_BASE.to_vec();
    v.extend_from_slice(PEER_ENTRY);
    v.push(column);
    Oid(v)
}

/// A typed management variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// INTEGER / Integer32
    Integer(i32),
    /// Counter32
    Counter32(u32),
    /// IpAddress
    IpAddress(Ipv4Addr),
    /// OCTET STRING
    OctetString(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "INTEGER: {v}"),
            Value::Counter32(v) => write!(f, "Counter32: {v}"),
            Value::IpAddress(v) => write!(f, "IpAddress: {v}"),
            Value::OctetString(bytes) => {
                write!(f, "Hex-STRING:")?;
                for b in bytes {
                    write!(f, " {b:02X}")?;
                }
                Ok(())
            }
        }
    }
}

/// One OID/value pair as exposed to the management protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    /// Instance OID.
    pub oid: Oid,
    /// Typed value.
    pub value: Value,
}

impl VarBind {
    fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }
}

/// Poll-driven translator from the snapshot cache to variable bindings.
pub struct MibMapper {
    cache: Arc<SnapshotCache>,
}

impl MibMapper {
    /// Creates a mapper reading from the given cache.
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self { cache }
    }

    /// Builds the full binding set from the current snapshot.
    ///
    /// Invoked synchronously on every poll. A row that fails to build is
    /// logged and skipped; remaining rows are still emitted. An empty peer
    /// set yields the scalars and an empty table, which is not an error.
    /// Output is sorted in OID lexicographic order for getnext traversal.
    pub fn poll(&self) -> Vec<VarBind> {
        let snapshot = self.cache.current();

        let router_id = snapshot
            .router_id
            .parse::<Ipv4Addr>()
            .unwrap_or(Ipv4Addr::UNSPECIFIED);

        let mut bindings = vec![
            VarBind::new(bgp_version(), Value::Integer(4)),
            VarBind::new(bgp_local_as(), Value::Integer(snapshot.local_as as i32)),
            VarBind::new(bgp_identifier(), Value::IpAddress(router_id)),
        ];

        for peer in &snapshot.peers {
            match build_row(peer) {
                Ok(row) => bindings.extend(row),
                Err(e) => {
                    warn!(peer = %peer.name, error = %e, "Skipping malformed table row");
                }
            }
        }

        bindings.sort_by(|a, b| a.oid.cmp(&b.oid));
        bindings
    }
}

/// Builds the column bindings for one bgpPeerTable row.
fn build_row(peer: &PeerRecord) -> AgentResult<Vec<VarBind>> {
    let index: Ipv4Addr = peer
        .remote_address
        .parse()
        .map_err(|_| AgentError::RowBuild {
            index: peer.remote_address.clone(),
            message: "remote address is not an IPv4 literal".to_string(),
        })?;

    // bgpPeerIdentifier is an IpAddress when the peer reported one,
    // otherwise its raw text is carried as an octet string.
    let identifier = match peer.peer_identifier.parse::<Ipv4Addr>() {
        Ok(addr) => Value::IpAddress(addr),
        Err(_) => Value::OctetString(peer.peer_identifier.as_bytes().to_vec()),
    };

    let admin_status = if peer.admin_down {
        ADMIN_STOP
    } else {
        ADMIN_START
    };

    let cell = |column: u32| peer_column(column).with_ipv4_index(index);

    Ok(vec![
        VarBind::new(cell(col::PEER_IDENTIFIER), identifier),
        VarBind::new(cell(col::PEER_STATE), Value::Integer(peer.state.as_i32())),
        VarBind::new(cell(col::PEER_ADMIN_STATUS), Value::Integer(admin_status)),
        VarBind::new(cell(col::REMOTE_ADDR), Value::IpAddress(index)),
        VarBind::new(cell(col::REMOTE_AS), Value::Integer(peer.remote_as as i32)),
        VarBind::new(cell(col::IN_UPDATES), Value::Counter32(peer.in_updates)),
        VarBind::new(cell(col::OUT_UPDATES), Value::Counter32(peer.out_updates)),
        VarBind::new(cell(col::LAST_ERROR), Value::OctetString(peer.last_error.to_vec())),
    ])
}
