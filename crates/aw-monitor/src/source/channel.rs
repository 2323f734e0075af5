//! In-process event source backed by a crossbeam channel

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::info;

use super::EventSource;
use crate::error::{MonitorError, MonitorResult};
use crate::record::SourceRecord;

/// Maximum records returned by one poll
const MAX_BATCH: usize = 500;

/// Producer side of a [`ChannelSource`]
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: Sender<SourceRecord>,
}

impl RecordSender {
    /// Queue one record
    pub fn send(&self, record: SourceRecord) -> MonitorResult<()> {
        self.tx
            .send(record)
            .map_err(|_| MonitorError::AdapterFailure("record channel closed".to_string()))
    }

    /// Queue records in order
    pub fn send_all(&self, records: impl IntoIterator<Item = SourceRecord>) -> MonitorResult<()> {
        records.into_iter().try_for_each(|record| self.send(record))
    }
}

/// Event source fed by [`RecordSender`]s in the same process
#[derive(Debug)]
pub struct ChannelSource {
    rx: Option<Receiver<SourceRecord>>,
    disconnected: bool,
}

impl ChannelSource {
    /// Unbounded source and its sender
    pub fn new() -> (Self, RecordSender) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let source = Self {
            rx: Some(rx),
            disconnected: false,
        };
        (source, RecordSender { tx })
    }

    /// Records queued but not yet polled
    pub fn pending(&self) -> usize {
        self.rx.as_ref().map(Receiver::len).unwrap_or(0)
    }
}

impl EventSource for ChannelSource {
    fn poll(&mut self, timeout: Duration) -> MonitorResult<Vec<SourceRecord>> {
        let Some(rx) = self.rx.as_ref() else {
            thread::sleep(timeout);
            return Ok(Vec::new());
        };

        let first = match rx.recv_timeout(timeout) {
            Ok(record) => record,
            Err(RecvTimeoutError::Timeout) => return Ok(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => {
                if !self.disconnected {
                    info!("All record senders dropped, source is idle");
                    self.disconnected = true;
                }
                // Keep the poll bounded rather than returning at once
                thread::sleep(timeout);
                return Ok(Vec::new());
            }
        };

        let mut batch = Vec::with_capacity(rx.len().min(MAX_BATCH) + 1);
        batch.push(first);
        batch.extend(rx.try_iter().take(MAX_BATCH - 1));
        Ok(batch)
    }

    fn close(&mut self) {
        self.rx = None;
    }

    fn describe(&self) -> String {
        "in-process channel".to_string()
    }
}
