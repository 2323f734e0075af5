//! Alarm Monitor - owns the worker thread that feeds the store
//!
//! ```text
//! EventSource ──poll──▶ alarm-monitor thread ──apply──▶ EntityStore ◀── readers
//! ```
//!
//! The worker is the only writer. Stopping is cooperative: the stop flag is
//! checked once per poll, so shutdown takes at most one poll timeout plus the
//! time to reconcile the batch in hand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use aw_core::AlarmPv;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::reconciler::Reconciler;
use crate::report::{AlarmsDocument, DumpReport};
use crate::source::EventSource;
use crate::stats::{MonitorStats, StatsSnapshot};
use crate::store::EntityStore;

/// Name of the worker thread
pub const WORKER_THREAD_NAME: &str = "alarm-monitor";

struct Worker {
    handle: JoinHandle<Box<dyn EventSource>>,
    /// Disconnects when the worker returns (or unwinds)
    exited: Receiver<()>,
    source: String,
}

/// Running alarm monitor
pub struct AlarmMonitor {
    store: Arc<EntityStore>,
    stats: Arc<MonitorStats>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
    shutdown_grace: Duration,
}

impl AlarmMonitor {
    /// Subscribe to the configured Kafka topics and start monitoring
    #[cfg(feature = "kafka")]
    pub fn init(config: &MonitorConfig) -> MonitorResult<Self> {
        let source = crate::source::KafkaSource::subscribe(config)?;
        Self::start(Box::new(source), config)
    }

    /// Start monitoring `source` with an empty store
    pub fn start(source: Box<dyn EventSource>, config: &MonitorConfig) -> MonitorResult<Self> {
        Self::start_with_store(source, config, Arc::new(EntityStore::new()))
    }

    /// Start monitoring `source`, writing into `store`
    pub fn start_with_store(
        source: Box<dyn EventSource>,
        config: &MonitorConfig,
        store: Arc<EntityStore>,
    ) -> MonitorResult<Self> {
        config.validate()?;

        let stats = Arc::new(MonitorStats::new());
        let running = Arc::new(AtomicBool::new(true));
        let (exit_tx, exited) = crossbeam_channel::bounded::<()>(0);
        let description = source.describe();

        let handle = {
            let reconciler = Reconciler::new(Arc::clone(&store));
            let stats = Arc::clone(&stats);
            let running = Arc::clone(&running);
            let poll_timeout = config.poll_timeout();

            thread::Builder::new()
                .name(WORKER_THREAD_NAME.to_string())
                .spawn(move || {
                    let _exit = exit_tx;
                    Self::worker_loop(source, reconciler, stats, running, poll_timeout)
                })?
        };

        info!("Alarm monitor started on {}", description);

        Ok(Self {
            store,
            stats,
            running,
            worker: Mutex::new(Some(Worker {
                handle,
                exited,
                source: description,
            })),
            shutdown_grace: config.shutdown_grace(),
        })
    }

    /// Worker thread main loop
    fn worker_loop(
        mut source: Box<dyn EventSource>,
        reconciler: Reconciler,
        stats: Arc<MonitorStats>,
        running: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) -> Box<dyn EventSource> {
        debug!("Message handler reading {}", source.describe());

        while running.load(Ordering::Acquire) {
            let batch = match source.poll(poll_timeout) {
                Ok(batch) => batch,
                Err(e) => {
                    stats.poll_failed();
                    error!("Polling {} failed: {}", source.describe(), e);
                    thread::sleep(poll_timeout);
                    continue;
                }
            };
            trace!("Polled {} records", batch.len());

            for record in &batch {
                stats.record_received();
                match reconciler.apply(record) {
                    Ok(applied) => stats.record_applied(applied),
                    Err(e) => {
                        stats.record_failed();
                        let at = format!("{}[{}]@{}", record.topic, record.partition, record.offset);
                        if e.is_record_error() {
                            warn!("Skipping '{}' ({}): {}", record.key, at, e);
                        } else {
                            error!("Failed to apply '{}' ({}): {}", record.key, at, e);
                        }
                    }
                }
            }
        }

        debug!("Message handler done");
        source
    }

    /// Stop the worker and release the source.
    ///
    /// Waits up to the shutdown grace period. A worker still busy after that
    /// is left to finish on its own and drops the source when it does.
    pub fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        self.running.store(false, Ordering::Release);

        if let Err(RecvTimeoutError::Timeout) = worker.exited.recv_timeout(self.shutdown_grace) {
            warn!(
                "Alarm monitor on {} did not stop within {:?}",
                worker.source, self.shutdown_grace
            );
            return;
        }

        match worker.handle.join() {
            Ok(mut source) => {
                source.close();
                info!("Alarm monitor on {} stopped", worker.source);
            }
            Err(_) => error!("Alarm monitor on {} panicked", worker.source),
        }
    }

    /// Stop and consume the monitor
    pub fn shutdown(self) {
        self.stop();
    }

    /// Worker alive and not asked to stop
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Unacknowledged alarms, sorted by path
    pub fn active_alarms(&self) -> Vec<Arc<AlarmPv>> {
        self.store.active()
    }

    /// Acknowledged alarms, sorted by path
    pub fn acknowledged_alarms(&self) -> Vec<Arc<AlarmPv>> {
        self.store.acknowledged()
    }

    /// Diagnostic listing of the whole store
    pub fn dump(&self) -> DumpReport {
        DumpReport::capture(&self.store, self.stats.message_count())
    }

    pub fn alarms_document(&self) -> AlarmsDocument {
        AlarmsDocument::capture(&self.store)
    }
}

impl Drop for AlarmMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
