//! Kafka event source
//!
//! Every monitor consumes the alarm topics in a consumer group of its own
//! (`<prefix><uuid>`), so the broker never splits the stream between
//! instances. Offsets are never committed and `auto.offset.reset` is
//! `earliest`: each partition assignment, initial or after a rebalance,
//! therefore starts reading at the beginning and replays the complete
//! config and state history.

use std::time::Duration;

use log::{debug, info, warn};
use rdkafka::consumer::{BaseConsumer, Consumer, ConsumerContext, Rebalance};
use rdkafka::message::Message;
use rdkafka::{ClientConfig, ClientContext};

use super::EventSource;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::record::SourceRecord;

/// Maximum records returned by one poll
const MAX_BATCH: usize = 500;

/// Consumer context logging partition assignment
pub struct AlarmConsumerContext {
    group_id: String,
}

impl ClientContext for AlarmConsumerContext {}

impl ConsumerContext for AlarmConsumerContext {
    fn pre_rebalance(&self, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(tpl) => {
                // No committed offsets: assignment resumes at the earliest offset
                for elem in tpl.elements() {
                    info!(
                        "{}: reading from start of '{}' partition {}",
                        self.group_id,
                        elem.topic(),
                        elem.partition()
                    );
                }
            }
            Rebalance::Revoke(tpl) => {
                // Nothing to checkpoint, the next assignment replays anyway
                debug!("{}: {} partitions revoked", self.group_id, tpl.count());
            }
            Rebalance::Error(msg) => {
                warn!("{}: rebalance error: {}", self.group_id, msg);
            }
        }
    }
}

/// Event source consuming alarm topics from Kafka
pub struct KafkaSource {
    consumer: Option<BaseConsumer<AlarmConsumerContext>>,
    group_id: String,
    server: String,
    topics: Vec<String>,
}

impl KafkaSource {
    /// Connect and subscribe with a fresh private consumer group
    pub fn subscribe(config: &MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;
        let group_id = config.consumer_group_id();

        info!(
            "{} subscribes to {} for {:?}",
            group_id, config.server, config.topics
        );

        let consumer: BaseConsumer<AlarmConsumerContext> = ClientConfig::new()
            .set("bootstrap.servers", &config.server)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .create_with_context(AlarmConsumerContext {
                group_id: group_id.clone(),
            })
            .map_err(|e| MonitorError::AdapterFailure(format!("create consumer: {e}")))?;

        let topics: Vec<&str> = config.topics.iter().map(String::as_str).collect();
        consumer
            .subscribe(&topics)
            .map_err(|e| MonitorError::AdapterFailure(format!("subscribe {topics:?}: {e}")))?;

        Ok(Self {
            consumer: Some(consumer),
            group_id,
            server: config.server.clone(),
            topics: config.topics.clone(),
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }
}

impl EventSource for KafkaSource {
    fn poll(&mut self, timeout: Duration) -> MonitorResult<Vec<SourceRecord>> {
        let Some(consumer) = self.consumer.as_ref() else {
            std::thread::sleep(timeout);
            return Ok(Vec::new());
        };

        let mut batch = Vec::new();
        let mut wait = timeout;
        while batch.len() < MAX_BATCH {
            let Some(result) = consumer.poll(wait) else {
                break;
            };
            // Only the first poll waits; the rest drain what is buffered
            wait = Duration::ZERO;

            let msg = match result {
                Ok(msg) => msg,
                Err(e) if batch.is_empty() => {
                    return Err(MonitorError::AdapterFailure(e.to_string()));
                }
                Err(e) => {
                    // Hand out what was read so far
                    warn!("{}: {}", self.group_id, e);
                    break;
                }
            };
            let Some(key) = msg.key() else {
                debug!("Skipping record without key at {}:{}", msg.topic(), msg.offset());
                continue;
            };
            let value = msg
                .payload()
                .map(|payload| String::from_utf8_lossy(payload).into_owned());
            batch.push(
                SourceRecord::new(String::from_utf8_lossy(key).into_owned(), value).at(
                    msg.topic(),
                    msg.partition(),
                    msg.offset(),
                ),
            );
        }
        Ok(batch)
    }

    fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.unsubscribe();
            info!("{} closed", self.group_id);
        }
    }

    fn describe(&self) -> String {
        format!("{} on {} for {:?}", self.group_id, self.server, self.topics)
    }
}

impl Drop for KafkaSource {
    fn drop(&mut self) {
        self.close();
    }
}
