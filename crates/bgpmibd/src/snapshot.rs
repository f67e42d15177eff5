//! Peering state data model.
//!
//! A [`Snapshot`] is the unit of consistency in this daemon: it is built
//! once at the end of a successful collection cycle, never mutated after
//! construction, and replaced whole in the cache. Readers either see the
//! previous snapshot or the new one, never a mix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// BGP finite-state-machine states with their BGP4-MIB numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum BgpState {
    /// idle(1)
    Idle = 1,
    /// connect(2)
    Connect = 2,
    /// active(3)
    Active = 3,
    /// opensent(4)
    OpenSent = 4,
    /// openconfirm(5)
    OpenConfirm = 5,
    /// established(6)
    Established = 6,
}

impl BgpState {
    /// Maps a state token to its MIB state, case-insensitively.
    ///
    /// Any unrecognized token maps to [`BgpState::Idle`]; BIRD's output is
    /// not a versioned contract and unknown tokens must not abort a parse.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "idle" => BgpState::Idle,
            "connect" => BgpState::Connect,
            "active" => BgpState::Active,
            "opensent" => BgpState::OpenSent,
            "openconfirm" => BgpState::OpenConfirm,
            "established" => BgpState::Established,
            _ => BgpState::Idle,
        }
    }

    /// The bgpPeerState integer value (1-6).
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Default for BgpState {
    fn default() -> Self {
        BgpState::Idle
    }
}

/// One BGP peering session as exposed in the bgpPeerTable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// BIRD protocol instance name (e.g. "peer1").
    pub name: String,

    /// Remote address as an IPv4 literal; doubles as the table index.
    /// Assembly guarantees this parses as `Ipv4Addr` and is unique
    /// within a snapshot.
    pub remote_address: String,

    /// Session state.
    pub state: BgpState,

    /// Remote autonomous system number.
    pub remote_as: u32,

    /// Peer router identifier; an IPv4 literal when BIRD reports one,
    /// otherwise falls back to the remote address.
    pub peer_identifier: String,

    /// Received UPDATE count (bgpPeerInUpdates).
    pub in_updates: u32,

    /// Sent UPDATE count (bgpPeerOutUpdates).
    pub out_updates: u32,

    /// Last error code/subcode pair (bgpPeerLastError); zero-filled
    /// when unknown.
    pub last_error: [u8; 2],

    /// True when the protocol is administratively disabled
    /// (drives bgpPeerAdminStatus stop(1)/start(2)).
    pub admin_down: bool,
}

/// One consistent point-in-time view of the router's BGP state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Router identifier (bgpIdentifier); "0.0.0.0" when unknown.
    pub router_id: String,

    /// Local autonomous system number (bgpLocalAs).
    pub local_as: u32,

    /// Peering sessions, in collection order, unique by remote address.
    pub peers: Vec<PeerRecord>,

    /// When this snapshot was captured.
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Creates an empty snapshot, used to seed the cache before the first
    /// successful collection cycle.
    pub fn empty() -> Self {
        Self {
            router_id: birdctl::parse::DEFAULT_ROUTER_ID.to_string(),
            local_as: 0,
            peers: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    /// Returns the peer record with the given remote address, if any.
    pub fn peer(&self, remote_address: &str) -> Option<&PeerRecord> {
        self.peers.iter().find(|p| p.remote_address == remote_address)
    }
}
