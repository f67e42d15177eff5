//! End-to-end tests: scripted BIRD output through collection, the snapshot
//! cache, and the MIB mapper.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use birdctl::{ControlChannel, ControlError, ControlResult};

use bgpmibd::mib::bgp4_root;
use bgpmibd::{
    BgpState, BirdSource, Collector, MibMapper, Oid, SnapshotCache, SnapshotSource, Value, VarBind,
};

/// Control channel answering from a canned command/output table.
///
/// Commands without a scripted answer fail with a transport error, which
/// doubles as the unreachable-daemon case.
struct ScriptedChannel {
    responses: HashMap<String, String>,
}

impl ScriptedChannel {
    fn new(responses: &[(&str, &str)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn unreachable() -> Self {
        Self::new(&[])
    }
}

#[async_trait]
impl ControlChannel for ScriptedChannel {
    async fn send(&self, command: &str) -> ControlResult<String> {
        self.responses
            .get(command)
            .cloned()
            .ok_or_else(|| ControlError::command_failed(command, 1, "connection refused"))
    }
}

const STATUS: &str = "BIRD 2.0.8 ready.\nRouter ID is 10.0.0.1\n";

const SUMMARY_ONE_PEER: &str = "Name       Proto      Table      State  Since         Info\n\
    peer1      BGP        ---        up     2024-05-01    Established\n";

const DETAIL_PEER1: &str = "peer1      BGP        ---        up     2024-05-01    Established\n\
    \x20 BGP state: Established\n\
    \x20   Neighbor address: 10.0.0.2\n\
    \x20   Neighbor AS: 65002\n\
    \x20   Local AS: 65001\n";

fn scenario_channel() -> ScriptedChannel {
    ScriptedChannel::new(&[
        ("show status", STATUS),
        ("show protocols", SUMMARY_ONE_PEER),
        ("show protocols all peer1", DETAIL_PEER1),
    ])
}

fn find<'a>(bindings: &'a [VarBind], oid: &Oid) -> &'a Value {
    &bindings
        .iter()
        .find(|vb| &vb.oid == oid)
        .unwrap_or_else(|| panic!("missing binding {oid}"))
        .value
}

fn peer_state_oid(addr: Ipv4Addr) -> Oid {
    // bgpPeerState: bgpPeerTable(3).bgpPeerEntry(1).bgpPeerState(2).<index>
    bgp4_root().extended(&[3, 1, 2]).with_ipv4_index(addr)
}

fn remote_addr_oid(addr: Ipv4Addr) -> Oid {
    bgp4_root().extended(&[3, 1, 7]).with_ipv4_index(addr)
}

#[tokio::test]
async fn end_to_end_scenario() {
    let source = BirdSource::new(scenario_channel(), 64999);
    let snapshot = source.collect().await.unwrap();

    assert_eq!(snapshot.router_id, "10.0.0.1");
    assert_eq!(snapshot.local_as, 65001);
    assert_eq!(snapshot.peers.len(), 1);

    let peer = &snapshot.peers[0];
    assert_eq!(peer.remote_address, "10.0.0.2");
    assert_eq!(peer.remote_as, 65002);
    assert_eq!(peer.state, BgpState::Established);
    // No Neighbor ID line: identifier falls back to the remote address.
    assert_eq!(peer.peer_identifier, "10.0.0.2");

    let cache = Arc::new(SnapshotCache::default());
    cache.publish(snapshot);
    let bindings = MibMapper::new(Arc::clone(&cache)).poll();

    let index: Ipv4Addr = "10.0.0.2".parse().unwrap();
    assert_eq!(find(&bindings, &peer_state_oid(index)), &Value::Integer(6));
    assert_eq!(
        find(&bindings, &bgp4_root().extended(&[2, 0])),
        &Value::Integer(65001)
    );
    assert_eq!(
        find(&bindings, &bgp4_root().extended(&[3, 0])),
        &Value::IpAddress("10.0.0.1".parse().unwrap())
    );
}

#[tokio::test]
async fn collection_is_deterministic() {
    let source = BirdSource::new(scenario_channel(), 64999);

    let first = source.collect().await.unwrap();
    let second = source.collect().await.unwrap();

    // Identical input text yields identical state (timestamps aside).
    assert_eq!(first.router_id, second.router_id);
    assert_eq!(first.local_as, second.local_as);
    assert_eq!(first.peers, second.peers);
}

#[tokio::test]
async fn failed_cycle_keeps_last_good_snapshot() {
    let cache = Arc::new(SnapshotCache::default());

    let good = Collector::new(
        BirdSource::new(scenario_channel(), 64999),
        Arc::clone(&cache),
        Duration::from_secs(15),
    );
    good.run_cycle().await;
    let before = cache.current();
    assert_eq!(before.peers.len(), 1);

    let failing = Collector::new(
        BirdSource::new(ScriptedChannel::unreachable(), 64999),
        Arc::clone(&cache),
        Duration::from_secs(15),
    );
    failing.run_cycle().await;

    let after = cache.current();
    assert!(Arc::ptr_eq(&before, &after));
}

#[tokio::test]
async fn non_ipv4_peer_never_reaches_the_table() {
    let summary = "peer1      BGP        ---        up     2024-05-01    Established\n\
        peer6      BGP        ---        up     2024-05-01    Established\n";
    let detail_v6 = "  BGP state: Established\n  Neighbor address: 2001:db8::1\n";
    let channel = ScriptedChannel::new(&[
        ("show status", STATUS),
        ("show protocols", summary),
        ("show protocols all peer1", DETAIL_PEER1),
        ("show protocols all peer6", detail_v6),
    ]);

    let snapshot = BirdSource::new(channel, 64999).collect().await.unwrap();
    assert_eq!(snapshot.peers.len(), 1);
    assert_eq!(snapshot.peers[0].name, "peer1");

    let cache = Arc::new(SnapshotCache::default());
    cache.publish(snapshot);
    let bindings = MibMapper::new(cache).poll();

    // 3 scalars + exactly one row of 8 columns.
    assert_eq!(bindings.len(), 3 + 8);
}

#[tokio::test]
async fn detail_transport_failure_drops_only_that_peer() {
    let summary = "peer1      BGP        ---        up     2024-05-01    Established\n\
        peer2      BGP        ---        up     2024-05-01    Established\n";
    // No script entry for peer2: its detail query fails.
    let channel = ScriptedChannel::new(&[
        ("show status", STATUS),
        ("show protocols", summary),
        ("show protocols all peer1", DETAIL_PEER1),
    ]);

    let snapshot = BirdSource::new(channel, 64999).collect().await.unwrap();
    assert_eq!(snapshot.peers.len(), 1);
    assert_eq!(snapshot.peers[0].name, "peer1");
}

#[tokio::test]
async fn duplicate_remote_address_collapses_to_last_seen() {
    let summary = "peerA      BGP        ---        up     2024-05-01    Established\n\
        peerB      BGP        ---        up     2024-05-01    Established\n";
    let detail_a = "  BGP state: Active\n  Neighbor address: 10.0.0.2\n  Neighbor AS: 65002\n";
    let detail_b = "  BGP state: Established\n  Neighbor address: 10.0.0.2\n  Neighbor AS: 65003\n";
    let channel = ScriptedChannel::new(&[
        ("show status", STATUS),
        ("show protocols", summary),
        ("show protocols all peerA", detail_a),
        ("show protocols all peerB", detail_b),
    ]);

    let snapshot = BirdSource::new(channel, 64999).collect().await.unwrap();
    assert_eq!(snapshot.peers.len(), 1);
    assert_eq!(snapshot.peers[0].name, "peerB");
    assert_eq!(snapshot.peers[0].remote_as, 65003);
}

#[tokio::test]
async fn empty_peer_set_exposes_scalars_and_empty_table() {
    let channel = ScriptedChannel::new(&[
        ("show status", "BIRD 2.0.8 ready.\n"),
        ("show protocols", "Name       Proto      Table      State  Since\n"),
    ]);

    let snapshot = BirdSource::new(channel, 65000).collect().await.unwrap();
    assert!(snapshot.peers.is_empty());
    // Missing router ID line degrades to the default.
    assert_eq!(snapshot.router_id, "0.0.0.0");
    assert_eq!(snapshot.local_as, 65000);

    let cache = Arc::new(SnapshotCache::default());
    cache.publish(snapshot);
    let bindings = MibMapper::new(cache).poll();
    assert_eq!(bindings.len(), 3);
    assert_eq!(
        find(&bindings, &bgp4_root().extended(&[1, 0])),
        &Value::Integer(4)
    );
}

#[tokio::test]
async fn state_tokens_map_case_insensitively() {
    for token in ["Established", "ESTABLISHED", "established"] {
        let detail = format!("  BGP state: {token}\n  Neighbor address: 10.0.0.2\n");
        let channel = ScriptedChannel::new(&[
            ("show status", STATUS),
            ("show protocols", SUMMARY_ONE_PEER),
            ("show protocols all peer1", detail.as_str()),
        ]);
        let snapshot = BirdSource::new(channel, 65000).collect().await.unwrap();
        assert_eq!(snapshot.peers[0].state, BgpState::Established);
    }

    // Unrecognized token maps to idle(1).
    let detail = "  BGP state: flapping\n  Neighbor address: 10.0.0.2\n";
    let channel = ScriptedChannel::new(&[
        ("show status", STATUS),
        ("show protocols", SUMMARY_ONE_PEER),
        ("show protocols all peer1", detail),
    ]);
    let snapshot = BirdSource::new(channel, 65000).collect().await.unwrap();
    assert_eq!(snapshot.peers[0].state, BgpState::Idle);
}

#[tokio::test]
async fn remote_addr_column_value_equals_row_index() {
    let source = BirdSource::new(scenario_channel(), 64999);
    let snapshot = source.collect().await.unwrap();

    let cache = Arc::new(SnapshotCache::default());
    cache.publish(snapshot.clone());
    let bindings = MibMapper::new(cache).poll();

    for peer in &snapshot.peers {
        let index: Ipv4Addr = peer.remote_address.parse().unwrap();
        assert_eq!(
            find(&bindings, &remote_addr_oid(index)),
            &Value::IpAddress(index)
        );
    }
}
