//! Parsers for BIRD control channel output.
//!
//! BIRD's text output is version-sensitive and carries no machine-readable
//! contract, so every function here degrades per field: an absent or
//! malformed field yields `None` (or the documented default), never an
//! error. Lines that do not match an anchor are skipped.
//!
//! The anchors cover the BIRD 2.x dialect:
//!
//! ```text
//! Router ID is 10.0.0.1
//!
//! Name       Proto      Table      State  Since         Info
//! peer1      BGP        ---        up     2024-05-01    Established
//!
//!   BGP state:          Established
//!     Neighbor address: 10.0.0.2
//!     Neighbor AS:      65002
//!     Neighbor ID:      10.0.0.2
//!     Local AS:         65001
//!       Import updates:     5          0          0          0          5
//!       Export updates:     7          0          0        ---          7
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Router identifier line in `show status` output.
static ROUTER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Router ID is (\d+\.\d+\.\d+\.\d+)").expect("Invalid regex pattern"));

/// Local AS line; BIRD emits `Local AS:` in protocol detail, older
/// releases print `Local AS number` in status output.
static LOCAL_AS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)local as(?: number)?:?\s+(\d+)").expect("Invalid regex pattern"));

/// Router identifier used when the identifying line is absent.
pub const DEFAULT_ROUTER_ID: &str = "0.0.0.0";

/// One line of `show protocols` output describing a BGP session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// Protocol instance name (first column).
    pub name: String,
    /// Raw state token (fourth column, e.g. "up", "down", "start").
    pub state_token: String,
}

impl SummaryEntry {
    /// True if the session is up (coarse state maps to established).
    pub fn is_up(&self) -> bool {
        self.state_token.eq_ignore_ascii_case("up")
    }

    /// True if the protocol is administratively disabled.
    pub fn is_disabled(&self) -> bool {
        self.state_token.eq_ignore_ascii_case("down")
    }
}

/// Fields extracted from one peer's `show protocols all <name>` output.
///
/// Every field is optional; assembly applies defaults and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerDetail {
    /// Remote address from the `Neighbor address:` line.
    pub neighbor_address: Option<String>,
    /// Remote AS number from the `Neighbor AS:` line.
    pub neighbor_as: Option<u32>,
    /// Peer router identifier from the `Neighbor ID:` line.
    pub neighbor_id: Option<String>,
    /// Fine-grained session state from the `BGP state:` line.
    pub bgp_state: Option<String>,
    /// Received update count from the `Import updates:` stats row.
    pub import_updates: Option<u32>,
    /// Sent update count from the `Export updates:` stats row.
    pub export_updates: Option<u32>,
}

/// Extracts the router identifier from `show status` output.
///
/// Returns [`DEFAULT_ROUTER_ID`] when the identifying line is absent.
pub fn parse_router_id(text: &str) -> String {
    ROUTER_ID_RE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| DEFAULT_ROUTER_ID.to_string())
}

/// Extracts the local AS number, if the text carries one.
///
/// The caller applies its configured default on `None`.
pub fn parse_local_as(text: &str) -> Option<u32> {
    LOCAL_AS_RE.captures(text).and_then(|c| c[1].parse().ok())
}

/// Extracts BGP session lines from `show protocols` output.
///
/// Matches lines of the shape `<name> BGP <table> <state> ...`; anything
/// else (headers, other protocols, short lines) is skipped without error.
pub fn parse_protocol_summary(text: &str) -> Vec<SummaryEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 4 && parts[1] == "BGP" {
            entries.push(SummaryEntry {
                name: parts[0].to_string(),
                state_token: parts[3].to_string(),
            });
        }
    }
    entries
}

/// Returns the value part of `line` when it starts with `anchor`.
fn anchored<'a>(line: &'a str, anchor: &str) -> Option<&'a str> {
    line.strip_prefix(anchor).map(str::trim)
}

/// Returns the leading integer of an anchored stats row.
fn leading_count(rest: &str) -> Option<u32> {
    rest.split_whitespace().next().and_then(|t| t.parse().ok())
}

/// Extracts per-peer fields from `show protocols all <name>` output.
///
/// Field matchers are line-anchored; a malformed value (e.g. a non-numeric
/// AS) leaves that field `None` and parsing continues.
pub fn parse_peer_detail(text: &str) -> PeerDetail {
    let mut detail = PeerDetail::default();
    for raw in text.lines() {
        let line = raw.trim_start();
        if let Some(rest) = anchored(line, "Neighbor address:") {
            detail.neighbor_address = Some(rest.to_string());
        } else if let Some(rest) = anchored(line, "Neighbor AS:") {
            detail.neighbor_as = rest.parse().ok();
        } else if let Some(rest) = anchored(line, "Neighbor ID:") {
            detail.neighbor_id = Some(rest.to_string());
        } else if let Some(rest) = anchored(line, "BGP state:") {
            detail.bgp_state = Some(rest.to_string());
        } else if let Some(rest) = anchored(line, "Import updates:") {
            detail.import_updates = leading_count(rest);
        } else if let Some(rest) = anchored(line, "Export updates:") {
            detail.export_updates = leading_count(rest);
        }
    }
    detail
}
