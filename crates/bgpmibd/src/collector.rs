//! Periodic collection loop.
//!
//! The collector is the sole writer to the [`SnapshotCache`]. It runs on
//! its own fixed-interval timer, fully decoupled from poll timing, so an
//! SNMP query never blocks on BIRD latency. A failed cycle logs and leaves
//! the previous snapshot in place: stale-but-consistent data is preferred
//! over no data.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::snapshot::Snapshot;
use crate::source::SnapshotSource;

/// Default collection interval in seconds.
pub const DEFAULT_REFRESH_SECS: u64 = 15;

/// Timer-driven snapshot collector.
pub struct Collector<S: SnapshotSource> {
    source: S,
    cache: Arc<SnapshotCache>,
    interval: Duration,
}

impl<S: SnapshotSource> Collector<S> {
    /// Creates a collector writing to the given cache.
    pub fn new(source: S, cache: Arc<SnapshotCache>, interval: Duration) -> Self {
        Self {
            source,
            cache,
            interval,
        }
    }

    /// Runs collection cycles until the token is cancelled.
    ///
    /// Cancellation is observed between cycles (never mid-parse): the loop
    /// finishes or abandons its current wait and exits before the next
    /// cycle begins.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Collector starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Collector received stop signal, exiting");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Runs one collection cycle; publishes on success, keeps the previous
    /// snapshot on any failure.
    pub async fn run_cycle(&self) {
        match self.source.collect().await {
            Ok(mut snapshot) => {
                let previous = self.cache.current();
                merge_counters(&previous, &mut snapshot);
                debug!(peers = snapshot.peers.len(), "Publishing snapshot");
                self.cache.publish(snapshot);
            }
            Err(e) => {
                warn!(error = %e, "Collection cycle failed, keeping previous snapshot");
            }
        }
    }
}

/// Enforces counter monotonicity across cycles.
///
/// Update counters never decrease within a process lifetime, even when the
/// daemon restarts a session and resets its own statistics; each peer keeps
/// the maximum of its previous and freshly parsed values.
fn merge_counters(previous: &Snapshot, next: &mut Snapshot) {
    for peer in &mut next.peers {
        if let Some(prev) = previous.peer(&peer.remote_address) {
            peer.in_updates = peer.in_updates.max(prev.in_updates);
            peer.out_updates = peer.out_updates.max(prev.out_updates);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AgentError, AgentResult};
    use crate::snapshot::PeerRecord;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Source that replays a scripted sequence of cycle outcomes.
    struct SeqSource {
        outcomes: Mutex<VecDeque<AgentResult<Snapshot>>>,
    }

    impl SeqSource {
        fn new(outcomes: Vec<AgentResult<Snapshot>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
            }
        }
    }

    #[async_trait]
    impl SnapshotSource for SeqSource {
        async fn collect(&self) -> AgentResult<Snapshot> {
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Snapshot::empty()))
        }
    }

    fn transport_error() -> AgentError {
        birdctl::ControlError::command_failed("show status", 1, "socket gone").into()
    }

    fn snapshot_with_peer(in_updates: u32, out_updates: u32) -> Snapshot {
        Snapshot {
            local_as: 65001,
            peers: vec![PeerRecord {
                name: "peer1".to_string(),
                remote_address: "10.0.0.2".to_string(),
                in_updates,
                out_updates,
                ..Default::default()
            }],
            ..Snapshot::empty()
        }
    }

    #[tokio::test]
    async fn test_successful_cycle_publishes() {
        let cache = Arc::new(SnapshotCache::default());
        let collector = Collector::new(
            SeqSource::new(vec![Ok(snapshot_with_peer(5, 7))]),
            Arc::clone(&cache),
            Duration::from_secs(15),
        );

        collector.run_cycle().await;
        assert_eq!(cache.current().peers.len(), 1);
        assert_eq!(cache.current().local_as, 65001);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_snapshot() {
        let cache = Arc::new(SnapshotCache::default());
        let collector = Collector::new(
            SeqSource::new(vec![Ok(snapshot_with_peer(5, 7)), Err(transport_error())]),
            Arc::clone(&cache),
            Duration::from_secs(15),
        );

        collector.run_cycle().await;
        let before = cache.current();

        collector.run_cycle().await;
        let after = cache.current();

        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.peers.len(), 1);
    }

    #[tokio::test]
    async fn test_counters_never_decrease() {
        let cache = Arc::new(SnapshotCache::default());
        let collector = Collector::new(
            // Second cycle reports a regressed in_updates counter.
            SeqSource::new(vec![
                Ok(snapshot_with_peer(100, 50)),
                Ok(snapshot_with_peer(3, 60)),
            ]),
            Arc::clone(&cache),
            Duration::from_secs(15),
        );

        collector.run_cycle().await;
        collector.run_cycle().await;

        let peer = cache.current().peer("10.0.0.2").unwrap().clone();
        assert_eq!(peer.in_updates, 100);
        assert_eq!(peer.out_updates, 60);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancellation() {
        let cache = Arc::new(SnapshotCache::default());
        let collector = Collector::new(
            SeqSource::new(vec![]),
            Arc::clone(&cache),
            Duration::from_millis(10),
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn(collector.run(token.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("collector did not stop within the bounded wait")
            .unwrap();
    }
}
