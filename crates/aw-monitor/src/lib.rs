//! aw-monitor: Alarm stream reconciliation engine
//!
//! Follows the `config:<path>` / `state:<path>` records of one or more alarm
//! topics and keeps, per alarm PV:
//! - the current snapshot (or a tombstone once deleted or disabled)
//! - membership in the active or acknowledged alarm list
//!
//! ```text
//! EventSource (Kafka | channel | replay file)
//!      │ poll
//!      ▼
//! AlarmMonitor worker ──▶ Reconciler ──▶ EntityStore ──▶ active / acknowledged
//! ```
//!
//! Readers query the [`EntityStore`] (or the [`AlarmMonitor`] shortcuts) from
//! any thread while the worker is running.

mod config;
mod error;
mod monitor;
mod reconciler;
mod record;
mod report;
mod stats;
mod store;

pub mod source;

pub use config::*;
pub use error::*;
pub use monitor::*;
pub use reconciler::*;
pub use record::*;
pub use report::*;
pub use stats::*;
pub use store::*;

pub use source::{ChannelSource, EventSource, RecordSender, ReplaySource};

#[cfg(feature = "kafka")]
pub use source::KafkaSource;
