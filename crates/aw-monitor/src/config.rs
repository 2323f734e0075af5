//! Monitor configuration
//!
//! Defaults match a local single-broker setup. Hosts usually start from
//! [`MonitorConfig::from_env`] and override individual fields.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MonitorError, MonitorResult};

/// Broker address variable
pub const ALARM_SERVER: &str = "ALARM_SERVER";

/// Alarm configuration name(s), used as topic names
pub const ALARM_CONFIG: &str = "ALARM_CONFIG";

/// Complete monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Kafka bootstrap servers, `host:port[,host:port]`
    pub server: String,

    /// Topics to subscribe to
    pub topics: Vec<String>,

    /// Upper bound of one poll (ms)
    pub poll_timeout_ms: u64,

    /// How long `stop()` waits for the worker (ms)
    pub shutdown_grace_ms: u64,

    /// Consumer group prefix; a random suffix keeps every instance private
    pub group_prefix: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server: "localhost:9092".to_string(),
            topics: vec!["Accelerator".to_string()],
            poll_timeout_ms: 100,
            shutdown_grace_ms: 2000,
            group_prefix: "Alarm-".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Defaults overridden by `ALARM_SERVER` and `ALARM_CONFIG`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by variables resolved through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(server) = lookup(ALARM_SERVER).filter(|s| !s.trim().is_empty()) {
            config.server = server.trim().to_string();
        }
        if let Some(topics) = lookup(ALARM_CONFIG) {
            let topics = split_topics(&topics);
            if !topics.is_empty() {
                config.topics = topics;
            }
        }
        config
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> MonitorResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| MonitorError::Config(format!("Invalid {}: {e}", path.display())))
    }

    /// Validate the configuration
    pub fn validate(&self) -> MonitorResult<()> {
        if self.server.trim().is_empty() {
            return Err(MonitorError::Config("server cannot be empty".to_string()));
        }
        if self.topics.is_empty() || self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(MonitorError::Config(
                "at least one non-empty topic must be specified".to_string(),
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(MonitorError::Config(
                "poll_timeout_ms must be positive".to_string(),
            ));
        }
        if self.shutdown_grace_ms == 0 {
            return Err(MonitorError::Config(
                "shutdown_grace_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Fresh consumer group id.
    ///
    /// Every monitor must see the complete stream, so consumers never share
    /// a group.
    pub fn consumer_group_id(&self) -> String {
        format!("{}{}", self.group_prefix, Uuid::new_v4())
    }
}

/// Comma separated topic list
pub fn split_topics(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
        .collect()
}
