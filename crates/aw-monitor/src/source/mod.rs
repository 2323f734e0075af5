//! Event Source Adapters
//!
//! A source delivers the alarm topics as ordered batches of records. The
//! monitor relies on two guarantees from every implementation:
//!
//! 1. It sees the *complete* stream, never a share of a consumer group.
//! 2. Whenever partitions are (re)assigned, reading starts over at the
//!    earliest offset, so config and state history replay in full.

mod channel;
mod replay;

#[cfg(feature = "kafka")]
mod kafka;

pub use channel::{ChannelSource, RecordSender};
pub use replay::ReplaySource;

#[cfg(feature = "kafka")]
pub use kafka::KafkaSource;

use std::time::Duration;

use crate::error::MonitorResult;
use crate::record::SourceRecord;

/// Ordered record stream polled by the monitor worker
pub trait EventSource: Send {
    /// Wait up to `timeout` for the next batch; an empty batch is normal
    fn poll(&mut self, timeout: Duration) -> MonitorResult<Vec<SourceRecord>>;

    /// Release broker resources. Further polls return nothing.
    fn close(&mut self) {}

    /// Identity for log messages
    fn describe(&self) -> String;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn poll(&mut self, timeout: Duration) -> MonitorResult<Vec<SourceRecord>> {
        (**self).poll(timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
