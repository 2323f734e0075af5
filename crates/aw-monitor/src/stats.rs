//! Monitor counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::reconciler::Applied;

/// Counters updated by the monitor worker, readable from any thread
#[derive(Debug, Default)]
pub struct MonitorStats {
    records: AtomicU64,
    config_updates: AtomicU64,
    state_updates: AtomicU64,
    removals: AtomicU64,
    suppressed: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
    poll_failures: AtomicU64,
}

/// Point-in-time copy of [`MonitorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Records received, whatever became of them
    pub records: u64,
    pub config_updates: u64,
    pub state_updates: u64,
    /// Config deletions and disables
    pub removals: u64,
    /// States dropped because their PV is deleted or disabled
    pub suppressed: u64,
    pub ignored: u64,
    /// Records rejected with an error
    pub failed: u64,
    pub poll_failures: u64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self, applied: Applied) {
        let counter = match applied {
            Applied::Config => &self.config_updates,
            Applied::Deleted | Applied::Disabled => &self.removals,
            Applied::State => &self.state_updates,
            Applied::SuppressedByTombstone => &self.suppressed,
            Applied::Ignored(_) => &self.ignored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_failed(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records received so far
    pub fn message_count(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records: self.records.load(Ordering::Relaxed),
            config_updates: self.config_updates.load(Ordering::Relaxed),
            state_updates: self.state_updates.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = MonitorStats::new();
        for applied in [
            Applied::Config,
            Applied::Deleted,
            Applied::Disabled,
            Applied::State,
            Applied::State,
            Applied::SuppressedByTombstone,
            Applied::Ignored("test"),
        ] {
            stats.record_received();
            stats.record_applied(applied);
        }
        stats.record_received();
        stats.record_failed();
        stats.poll_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records, 8);
        assert_eq!(stats.message_count(), 8);
        assert_eq!(snapshot.config_updates, 1);
        assert_eq!(snapshot.removals, 2);
        assert_eq!(snapshot.state_updates, 2);
        assert_eq!(snapshot.suppressed, 1);
        assert_eq!(snapshot.ignored, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.poll_failures, 1);
    }
}
