use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use vex_core::Store;

/// Process-wide server counters, owned by [`crate::state::AppState`].
#[derive(Debug)]
pub(crate) struct ServerStats {
    started_at: Instant,
    total_commands: AtomicU64,
    active_connections: AtomicUsize,
    total_connections: AtomicU64,
    rejected_connections: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatsSnapshot {
    pub(crate) total_commands: u64,
    pub(crate) active_connections: usize,
    pub(crate) total_connections: u64,
    pub(crate) rejected_connections: u64,
    pub(crate) total_keys: usize,
    pub(crate) dimension: usize,
    pub(crate) partitions: usize,
    pub(crate) memory_usage_bytes: usize,
    pub(crate) uptime_ms: u64,
    pub(crate) qps: f64,
}

impl ServerStats {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_commands: AtomicU64::new(0),
            active_connections: AtomicUsize::new(0),
            total_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_command(&self) {
        self.total_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_connection(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    pub(crate) fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self, store: &Store) -> StatsSnapshot {
        let store_stats = store.stats();
        let uptime = self.started_at.elapsed();
        let total_commands = self.total_commands();
        let uptime_secs = uptime.as_secs_f64();
        let qps = if uptime_secs > 0.0 {
            total_commands as f64 / uptime_secs
        } else {
            0.0
        };

        StatsSnapshot {
            total_commands,
            active_connections: self.active_connections(),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            total_keys: store_stats.count,
            dimension: store_stats.dimension,
            partitions: store_stats.partitions,
            memory_usage_bytes: store_stats.vector_bytes,
            uptime_ms: u64::try_from(uptime.as_millis()).unwrap_or(u64::MAX),
            qps,
        }
    }
}

/// Holds one of the `max_connections` client slots until dropped.
#[derive(Debug)]
pub(crate) struct ConnectionSlot {
    stats: Arc<ServerStats>,
}

impl ConnectionSlot {
    /// Claims a slot, or returns `None` when `limit` clients are already active.
    pub(crate) fn acquire(stats: &Arc<ServerStats>, limit: usize) -> Option<Self> {
        stats
            .active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < limit).then_some(active + 1)
            })
            .ok()?;
        stats.total_connections.fetch_add(1, Ordering::Relaxed);
        Some(Self {
            stats: Arc::clone(stats),
        })
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.stats.active_connections.fetch_sub(1, Ordering::AcqRel);
    }
}
