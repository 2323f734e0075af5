//! Stream records and key classification

use serde_json::Value;

use crate::error::{MonitorError, MonitorResult};

/// Key prefix of configuration updates
pub const CONFIG_PREFIX: &str = "config:";

/// Key prefix of state updates
pub const STATE_PREFIX: &str = "state:";

/// One record as delivered by an event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: String,
    /// Raw JSON payload; `None` marks a deletion
    pub value: Option<String>,
}

impl SourceRecord {
    /// Record without broker coordinates
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            topic: String::new(),
            partition: 0,
            offset: 0,
            key: key.into(),
            value,
        }
    }

    /// `config:<path>` record carrying `payload`
    pub fn config(path: &str, payload: &Value) -> Self {
        Self::new(format!("{CONFIG_PREFIX}{path}"), Some(payload.to_string()))
    }

    /// `config:<path>` record without payload
    pub fn config_deleted(path: &str) -> Self {
        Self::new(format!("{CONFIG_PREFIX}{path}"), None)
    }

    /// `state:<path>` record carrying `payload`
    pub fn state(path: &str, payload: &Value) -> Self {
        Self::new(format!("{STATE_PREFIX}{path}"), Some(payload.to_string()))
    }

    /// Attach broker coordinates
    pub fn at(mut self, topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        self.topic = topic.into();
        self.partition = partition;
        self.offset = offset;
        self
    }

    /// Classify by key prefix
    pub fn kind(&self) -> RecordKind<'_> {
        RecordKind::of(&self.key)
    }

    /// Decode the payload, `None` when absent
    pub fn payload(&self) -> MonitorResult<Option<Value>> {
        self.value
            .as_deref()
            .map(|text| {
                serde_json::from_str(text).map_err(|source| MonitorError::MalformedPayload {
                    key: self.key.clone(),
                    source,
                })
            })
            .transpose()
    }
}

/// What a record key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind<'a> {
    Config(&'a str),
    State(&'a str),
    /// Commands, talk messages and anything else
    Other,
}

impl<'a> RecordKind<'a> {
    pub fn of(key: &'a str) -> Self {
        if let Some(path) = key.strip_prefix(CONFIG_PREFIX) {
            Self::Config(path)
        } else if let Some(path) = key.strip_prefix(STATE_PREFIX) {
            Self::State(path)
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind() {
        assert_eq!(RecordKind::of("config:/A/PV1"), RecordKind::Config("/A/PV1"));
        assert_eq!(RecordKind::of("state:/A/PV1"), RecordKind::State("/A/PV1"));
        assert_eq!(RecordKind::of("command:/A/PV1"), RecordKind::Other);
        assert_eq!(RecordKind::of("/A/PV1"), RecordKind::Other);
    }

    #[test]
    fn test_payload() {
        let record = SourceRecord::config("/A/PV1", &json!({"description": "Pump"}));
        assert_eq!(record.payload().unwrap(), Some(json!({"description": "Pump"})));

        assert_eq!(SourceRecord::config_deleted("/A/PV1").payload().unwrap(), None);

        let broken = SourceRecord::new("state:/A/PV1", Some("{not json".to_string()));
        assert!(matches!(
            broken.payload(),
            Err(MonitorError::MalformedPayload { ref key, .. }) if key == "state:/A/PV1"
        ));
    }
}
