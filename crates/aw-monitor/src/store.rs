//! Entity Store - concurrent path → PV map with derived alarm lists
//!
//! One writer (the monitor worker) commits per-path transitions; any number
//! of readers take snapshots. Each commit runs under the path's entry lock
//! and updates the slot and both alarm lists before the lock is released.
//!
//! The alarm lists hold the very `Arc<AlarmPv>` stored in the slot, so a
//! reader always gets fields and classification from the same snapshot.

use std::fmt;
use std::sync::Arc;

use aw_core::{AlarmPv, Membership};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

// ═══════════════════════════════════════════════════════════════════════════
// SLOT
// ═══════════════════════════════════════════════════════════════════════════

/// Stored value for a known path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Configured or observed PV
    Present(Arc<AlarmPv>),
    /// Explicitly deleted or disabled
    Tombstone,
}

impl Slot {
    pub fn entity(&self) -> Option<&Arc<AlarmPv>> {
        match self {
            Self::Present(pv) => Some(pv),
            Self::Tombstone => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(pv) => write!(f, "{pv}"),
            Self::Tombstone => f.write_str("<deleted>"),
        }
    }
}

/// Outcome of a per-path update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Leave the slot as it is
    Unchanged,
    /// Replace with a tombstone, dropping alarm list membership
    Tombstone,
    /// Publish a new PV snapshot and classify it
    Publish(AlarmPv),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE
// ═══════════════════════════════════════════════════════════════════════════

/// Thread-safe PV storage
#[derive(Debug, Default)]
pub struct EntityStore {
    /// Path → PV or tombstone
    slots: DashMap<String, Slot>,
    /// Paths in an unacknowledged alarm state
    active: DashMap<String, Arc<AlarmPv>>,
    /// Paths in an acknowledged alarm state
    acknowledged: DashMap<String, Arc<AlarmPv>>,
}

impl EntityStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic read-modify-write of one path.
    ///
    /// `f` sees the current slot (`None` for an unseen path) and decides the
    /// transition. Slot and alarm lists are committed while the path's entry
    /// is locked. `f` must not access the store.
    ///
    /// Returns the committed slot, or `None` when nothing changed.
    pub fn update<F>(&self, path: &str, f: F) -> Option<Slot>
    where
        F: FnOnce(Option<&Slot>) -> Transition,
    {
        let entry = self.slots.entry(path.to_string());
        let transition = match &entry {
            Entry::Occupied(occupied) => f(Some(occupied.get())),
            Entry::Vacant(_) => f(None),
        };

        let slot = match transition {
            Transition::Unchanged => return None,
            Transition::Tombstone => {
                self.purge_membership(path);
                Slot::Tombstone
            }
            Transition::Publish(pv) => {
                let pv = Arc::new(pv);
                self.classify(path, &pv);
                Slot::Present(pv)
            }
        };

        entry.insert(slot.clone());
        Some(slot)
    }

    /// Point lookup
    pub fn slot(&self, path: &str) -> Option<Slot> {
        self.slots.get(path).map(|slot| slot.clone())
    }

    /// Current PV of a path, `None` when unseen or tombstoned
    pub fn entity(&self, path: &str) -> Option<Arc<AlarmPv>> {
        self.slots
            .get(path)
            .and_then(|slot| slot.entity().cloned())
    }

    pub fn is_tombstone(&self, path: &str) -> bool {
        self.slots
            .get(path)
            .map(|slot| slot.is_tombstone())
            .unwrap_or(false)
    }

    pub fn is_active(&self, path: &str) -> bool {
        self.active.contains_key(path)
    }

    pub fn is_acknowledged(&self, path: &str) -> bool {
        self.acknowledged.contains_key(path)
    }

    /// Active alarms, sorted by path
    pub fn active(&self) -> Vec<Arc<AlarmPv>> {
        Self::sorted_members(&self.active, Membership::Active)
    }

    /// Acknowledged alarms, sorted by path
    pub fn acknowledged(&self) -> Vec<Arc<AlarmPv>> {
        Self::sorted_members(&self.acknowledged, Membership::Acknowledged)
    }

    /// All known paths with their slots, sorted by path
    pub fn slots(&self) -> Vec<(String, Slot)> {
        let mut slots: Vec<_> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));
        slots
    }

    /// All known paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.slots.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Number of known paths, tombstones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Forget everything
    pub fn clear(&self) {
        self.active.clear();
        self.acknowledged.clear();
        self.slots.clear();
    }

    // ───────────────────────────────────────────────────────────────────────

    /// Keyed removal from both alarm lists
    fn purge_membership(&self, path: &str) {
        self.active.remove(path);
        self.acknowledged.remove(path);
    }

    /// Move `path` to the alarm list matching the PV's severity.
    ///
    /// Removal from the other list happens first so the path is never
    /// listed twice.
    fn classify(&self, path: &str, pv: &Arc<AlarmPv>) {
        match pv.membership() {
            Membership::Active => {
                self.acknowledged.remove(path);
                self.active.insert(path.to_string(), Arc::clone(pv));
            }
            Membership::Acknowledged => {
                self.active.remove(path);
                self.acknowledged.insert(path.to_string(), Arc::clone(pv));
            }
            Membership::Normal => self.purge_membership(path),
        }
    }

    fn sorted_members(
        members: &DashMap<String, Arc<AlarmPv>>,
        membership: Membership,
    ) -> Vec<Arc<AlarmPv>> {
        let mut pvs: Vec<_> = members
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .filter(|pv| pv.membership() == membership)
            .collect();
        pvs.sort_by(|a, b| a.path().cmp(b.path()));
        pvs
    }
}
