//! Single-slot snapshot cache.
//!
//! Holds exactly one current [`Snapshot`] behind an `Arc` swap: the
//! collector loop is the sole writer, poll-driven readers take the current
//! `Arc` and keep it valid for as long as they hold it. The write lock is
//! held only for the pointer swap, so a reader never blocks on, or
//! triggers, collection activity.
//!
//! The cache is constructed explicitly and handed by `Arc` to both the
//! collector and the mapper; there is no process-wide singleton.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::snapshot::Snapshot;

/// Shared holder of the last fully-built snapshot.
#[derive(Debug)]
pub struct SnapshotCache {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotCache {
    /// Creates a cache seeded with the given snapshot (typically
    /// [`Snapshot::empty`] at startup).
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Replaces the stored snapshot atomically.
    ///
    /// Sole mutator; called only by the collector loop at the end of a
    /// successful cycle. Readers in flight keep the `Arc` they already
    /// obtained.
    pub fn publish(&self, snapshot: Snapshot) {
        *self.current.write() = Arc::new(snapshot);
    }

    /// Returns the current snapshot without blocking on collection.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Snapshot::empty())
    }
}
