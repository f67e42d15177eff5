//! Snapshot assembly from the routing daemon.
//!
//! [`SnapshotSource`] is the single "parse one collection cycle into a
//! snapshot" capability the collector loop runs against. There is exactly
//! one concrete implementation per supported daemon-output dialect;
//! [`BirdSource`] covers BIRD 2.x. A future output-format change is an
//! additional implementation, not a change to the cache or mapper layers.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use birdctl::{parse, ControlChannel};

use crate::error::{AgentError, AgentResult};
use crate::snapshot::{BgpState, PeerRecord, Snapshot};

/// Status query yielding the router identifier line.
const SHOW_STATUS: &str = "show status";

/// Summary query yielding one line per protocol instance.
const SHOW_PROTOCOLS: &str = "show protocols";

/// Produces one consistent snapshot per collection cycle.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Runs one full collection cycle against the daemon.
    ///
    /// Fails only on transport errors against the cycle-wide queries;
    /// per-peer and per-field problems degrade inside the snapshot.
    async fn collect(&self) -> AgentResult<Snapshot>;
}

/// Snapshot source for the BIRD control dialect.
pub struct BirdSource<C: ControlChannel> {
    channel: C,
    /// Fallback when no output carries a local AS number.
    local_as_default: u32,
}

impl<C: ControlChannel> BirdSource<C> {
    /// Creates a source over the given control channel.
    pub fn new(channel: C, local_as_default: u32) -> Self {
        Self {
            channel,
            local_as_default,
        }
    }
}

/// Builds one peer record from its summary line and detail text.
///
/// Returns `InvalidAddress` when the resolved remote address is missing
/// or not an IPv4 literal; such peers are dropped by the caller, never
/// stored under a placeholder index.
fn build_peer(entry: &parse::SummaryEntry, detail: &parse::PeerDetail) -> AgentResult<PeerRecord> {
    let remote_address = detail
        .neighbor_address
        .as_deref()
        .filter(|a| a.parse::<Ipv4Addr>().is_ok())
        .ok_or_else(|| {
            AgentError::invalid_address(&entry.name, detail.neighbor_address.as_deref())
        })?
        .to_string();

    // The coarse up/down state from the summary; the fine-grained
    // session state from the detail overrides it when present.
    let coarse = if entry.is_up() {
        BgpState::Established
    } else {
        BgpState::Idle
    };
    let state = detail
        .bgp_state
        .as_deref()
        .map(BgpState::from_token)
        .unwrap_or(coarse);

    let peer_identifier = detail
        .neighbor_id
        .clone()
        .unwrap_or_else(|| remote_address.clone());

    Ok(PeerRecord {
        name: entry.name.clone(),
        remote_address,
        state,
        remote_as: detail.neighbor_as.unwrap_or(0),
        peer_identifier,
        in_updates: detail.import_updates.unwrap_or(0),
        out_updates: detail.export_updates.unwrap_or(0),
        last_error: [0, 0],
        admin_down: entry.is_disabled(),
    })
}

#[async_trait]
impl<C: ControlChannel> SnapshotSource for BirdSource<C> {
    async fn collect(&self) -> AgentResult<Snapshot> {
        let status = self.channel.send(SHOW_STATUS).await?;
        let summary = self.channel.send(SHOW_PROTOCOLS).await?;

        let router_id = parse::parse_router_id(&status);
        let mut local_as = parse::parse_local_as(&summary);

        let mut peers: Vec<PeerRecord> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for entry in parse::parse_protocol_summary(&summary) {
            let detail_cmd = format!("show protocols all {}", entry.name);
            let detail_text = match self.channel.send(&detail_cmd).await {
                Ok(text) => text,
                Err(e) => {
                    // Transport failure on one peer drops that peer only.
                    warn!(peer = %entry.name, error = %e, "Detail query failed, dropping peer");
                    continue;
                }
            };

            let detail = parse::parse_peer_detail(&detail_text);
            if local_as.is_none() {
                local_as = parse::parse_local_as(&detail_text);
            }

            let record = match build_peer(&entry, &detail) {
                Ok(record) => record,
                Err(e) => {
                    warn!(peer = %entry.name, error = %e, "Dropping peer from snapshot");
                    continue;
                }
            };

            // Index uniqueness: one row per remote address, last-seen wins.
            match index_of.get(&record.remote_address) {
                Some(&pos) => {
                    warn!(
                        address = %record.remote_address,
                        previous = %peers[pos].name,
                        replacement = %record.name,
                        "Duplicate remote address in summary, last-seen wins"
                    );
                    peers[pos] = record;
                }
                None => {
                    index_of.insert(record.remote_address.clone(), peers.len());
                    peers.push(record);
                }
            }
        }

        let snapshot = Snapshot {
            router_id,
            local_as: local_as.unwrap_or(self.local_as_default),
            peers,
            captured_at: Utc::now(),
        };
        debug!(
            router_id = %snapshot.router_id,
            local_as = snapshot.local_as,
            peers = snapshot.peers.len(),
            "Collection cycle complete"
        );
        Ok(snapshot)
    }
}
