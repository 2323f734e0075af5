//! Read-side views of the store: the diagnostic dump and the alarms document

use std::fmt;
use std::sync::Arc;

use aw_core::{AlarmPv, AlarmPvJson};
use serde::{Deserialize, Serialize};

use crate::store::{EntityStore, Slot};

/// Width of the path column in the dump
const PATH_WIDTH: usize = 120;

/// Point-in-time listing of every known path and both alarm lists
#[derive(Debug, Clone)]
pub struct DumpReport {
    message_count: u64,
    slots: Vec<(String, Slot)>,
    active: Vec<Arc<AlarmPv>>,
    acknowledged: Vec<Arc<AlarmPv>>,
}

impl DumpReport {
    pub fn capture(store: &EntityStore, message_count: u64) -> Self {
        Self {
            message_count,
            slots: store.slots(),
            active: store.active(),
            acknowledged: store.acknowledged(),
        }
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn slots(&self) -> &[(String, Slot)] {
        &self.slots
    }

    pub fn active(&self) -> &[Arc<AlarmPv>] {
        &self.active
    }

    pub fn acknowledged(&self) -> &[Arc<AlarmPv>] {
        &self.acknowledged
    }
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Message Count: {}", self.message_count)?;

        writeln!(f)?;
        writeln!(f, "CONFIG:")?;
        for (i, (path, slot)) in self.slots.iter().enumerate() {
            writeln!(f, "{:4} {:<width$} {}", i + 1, path, slot, width = PATH_WIDTH)?;
        }

        writeln!(f)?;
        writeln!(f, "ACTIVE:")?;
        for pv in &self.active {
            writeln!(f, "{pv}")?;
        }

        writeln!(f)?;
        writeln!(f, "ACKNOWLEDGED:")?;
        for pv in &self.acknowledged {
            writeln!(f, "{pv}")?;
        }
        Ok(())
    }
}

/// Both alarm lists in their JSON form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmsDocument {
    pub active: Vec<AlarmPvJson>,
    pub acknowledged: Vec<AlarmPvJson>,
}

impl AlarmsDocument {
    pub fn capture(store: &EntityStore) -> Self {
        Self {
            active: store.active().iter().map(|pv| pv.to_json()).collect(),
            acknowledged: store.acknowledged().iter().map(|pv| pv.to_json()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.acknowledged.is_empty()
    }
}
