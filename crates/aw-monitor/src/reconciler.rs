//! Update Reconciler
//!
//! Merges `config:` and `state:` records into the [`EntityStore`].
//!
//! Config and state for one path arrive on independent channels and in no
//! particular order: a state may precede the config that defines its PV, and
//! a late state may follow the config deletion of its PV. The merge rules
//! converge to the same result either way:
//!
//! - unknown path: create a PV with defaults, then apply the update
//! - deleted or disabled path: tombstone it; only an enabling config brings
//!   it back, and states for a tombstoned path are dropped

use std::sync::Arc;

use aw_core::{AlarmPv, AlarmUpdate, SeverityLevel, OK_MESSAGE};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde_json::Value;

use crate::error::MonitorResult;
use crate::record::{RecordKind, SourceRecord};
use crate::store::{EntityStore, Slot, Transition};

/// What a record did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// PV created or description updated
    Config,
    /// Config deleted (record without payload)
    Deleted,
    /// Config with `"enabled": false`
    Disabled,
    /// Alarm state applied
    State,
    /// State for a deleted or disabled PV
    SuppressedByTombstone,
    /// Not an alarm PV update
    Ignored(&'static str),
}

impl Applied {
    /// Deletion or disablement
    pub fn is_removal(self) -> bool {
        matches!(self, Self::Deleted | Self::Disabled)
    }
}

/// Applies stream records to an [`EntityStore`]
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Arc<EntityStore>,
}

impl Reconciler {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Apply one record.
    ///
    /// Errors concern only this record; the store is left untouched.
    pub fn apply(&self, record: &SourceRecord) -> MonitorResult<Applied> {
        let applied = match record.kind() {
            RecordKind::Config(path) => self.apply_config(path, record.payload()?),
            RecordKind::State(path) => self.apply_state(path, record.payload()?)?,
            RecordKind::Other => Applied::Ignored("not a config or state key"),
        };

        match applied {
            Applied::Ignored(reason) => debug!("Ignoring '{}': {}", record.key, reason),
            _ => trace!("{} -> {:?}", record.key, applied),
        }
        Ok(applied)
    }

    fn apply_config(&self, path: &str, payload: Option<Value>) -> Applied {
        let Some(json) = payload else {
            self.store.update(path, |_| Transition::Tombstone);
            return Applied::Deleted;
        };

        // PV configurations have a description, other tree nodes don't
        let Some(description) = field(&json, "description").map(as_text) else {
            return Applied::Ignored("config without description");
        };

        let enabled = field(&json, "enabled").map(as_bool).unwrap_or(true);
        if !enabled {
            self.store.update(path, |_| Transition::Tombstone);
            return Applied::Disabled;
        }

        self.store.update(path, |current| {
            // Fresh PV for unseen and for deleted paths
            let pv = match current.and_then(Slot::entity) {
                Some(pv) => pv.with_description(description),
                None => AlarmPv::new(path).with_description(description),
            };
            Transition::Publish(pv)
        });
        Applied::Config
    }

    fn apply_state(&self, path: &str, payload: Option<Value>) -> MonitorResult<Applied> {
        let Some(json) = payload else {
            return Ok(Applied::Ignored("state without payload"));
        };

        // Only PV states carry both severities
        let Some(severity) = field(&json, "severity") else {
            return Ok(Applied::Ignored("state without severity"));
        };
        let Some(current_severity) = field(&json, "current_severity") else {
            return Ok(Applied::Ignored("state without current_severity"));
        };

        let update = AlarmUpdate {
            severity: as_text(severity).parse::<SeverityLevel>()?,
            current_severity: as_text(current_severity).parse::<SeverityLevel>()?,
            message: text_or(&json, "message", OK_MESSAGE),
            current_message: text_or(&json, "current_message", OK_MESSAGE),
            value: text_or(&json, "value", ""),
            timestamp: timestamp(&json),
        };

        let committed = self.store.update(path, |current| match current {
            // Deletion wins over any state, including stale ones arriving late
            Some(Slot::Tombstone) => Transition::Unchanged,
            Some(Slot::Present(pv)) => Transition::Publish(pv.with_alarm(update)),
            None => Transition::Publish(AlarmPv::new(path).with_alarm(update)),
        });

        Ok(match committed {
            Some(_) => Applied::State,
            None => Applied::SuppressedByTombstone,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PAYLOAD HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Object member, treating JSON `null` as missing
fn field<'a>(json: &'a Value, name: &str) -> Option<&'a Value> {
    json.get(name).filter(|value| !value.is_null())
}

/// Text form of a scalar; containers have none
fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn text_or(json: &Value, name: &str, default: &str) -> String {
    field(json, name)
        .map(as_text)
        .unwrap_or_else(|| default.to_string())
}

/// `time.seconds` / `time.nano`, or now when absent or malformed
fn timestamp(json: &Value) -> DateTime<Utc> {
    field(json, "time")
        .and_then(|time| {
            let seconds = time.get("seconds")?.as_i64()?;
            let nano = match field(time, "nano") {
                Some(nano) => u32::try_from(nano.as_u64()?).ok()?,
                None => 0,
            };
            if nano >= 1_000_000_000 {
                return None;
            }
            DateTime::from_timestamp(seconds, nano)
        })
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use aw_core::Membership;
    use serde_json::json;

    fn reconciler() -> Reconciler {
        Reconciler::new(Arc::new(EntityStore::new()))
    }

    fn major() -> Value {
        json!({
            "severity": "MAJOR",
            "current_severity": "MAJOR",
            "message": "High",
            "current_message": "High",
            "value": "5",
            "time": {"seconds": 1_600_000_000, "nano": 500_000_000}
        })
    }

    #[test]
    fn test_unknown_key_ignored() {
        let r = reconciler();
        let applied = r
            .apply(&SourceRecord::new("command:/A/PV1", Some("not json".into())))
            .unwrap();
        assert!(matches!(applied, Applied::Ignored(_)));
        assert!(r.store().is_empty());
    }

    #[test]
    fn test_config_creates_pv() {
        let r = reconciler();
        let applied = r
            .apply(&SourceRecord::config("/A/PV1", &json!({"description": "Pump"})))
            .unwrap();
        assert_eq!(applied, Applied::Config);

        let pv = r.store().entity("/A/PV1").unwrap();
        assert_eq!(pv.description(), "Pump");
        assert_eq!(pv.severity(), SeverityLevel::Ok);
        assert_eq!(pv.membership(), Membership::Normal);
    }

    #[test]
    fn test_config_without_description_ignored() {
        let r = reconciler();
        let applied = r
            .apply(&SourceRecord::config("/A", &json!({"guidance": []})))
            .unwrap();
        assert!(matches!(applied, Applied::Ignored(_)));
        assert_eq!(r.store().slot("/A"), None);
    }

    #[test]
    fn test_config_delete() {
        let r = reconciler();
        r.apply(&SourceRecord::state("/A/PV1", &major())).unwrap();
        assert!(r.store().is_active("/A/PV1"));

        let applied = r.apply(&SourceRecord::config_deleted("/A/PV1")).unwrap();
        assert_eq!(applied, Applied::Deleted);
        assert!(r.store().is_tombstone("/A/PV1"));
        assert!(!r.store().is_active("/A/PV1"));
    }

    #[test]
    fn test_config_disable_skips_description() {
        let r = reconciler();
        r.apply(&SourceRecord::config("/A/PV1", &json!({"description": "Pump"})))
            .unwrap();
        let applied = r
            .apply(&SourceRecord::config(
                "/A/PV1",
                &json!({"description": "Changed", "enabled": false}),
            ))
            .unwrap();
        assert_eq!(applied, Applied::Disabled);
        assert!(applied.is_removal());
        assert!(!Applied::Config.is_removal());
        assert!(r.store().is_tombstone("/A/PV1"));
    }

    #[test]
    fn test_state_fields_and_defaults() {
        let r = reconciler();
        r.apply(&SourceRecord::state("/A/PV1", &major())).unwrap();

        let pv = r.store().entity("/A/PV1").unwrap();
        assert_eq!(pv.description(), "PV1");
        assert_eq!(pv.message(), "High");
        assert_eq!(pv.value(), "5");
        assert_eq!(pv.timestamp().timestamp(), 1_600_000_000);
        assert_eq!(pv.timestamp().timestamp_subsec_nanos(), 500_000_000);

        r.apply(&SourceRecord::state(
            "/A/PV2",
            &json!({"severity": "MINOR_ACK", "current_severity": "OK"}),
        ))
        .unwrap();
        let pv = r.store().entity("/A/PV2").unwrap();
        assert_eq!(pv.message(), "OK");
        assert_eq!(pv.current_message(), "OK");
        assert_eq!(pv.value(), "");
        assert!(r.store().is_acknowledged("/A/PV2"));
    }

    #[test]
    fn test_state_requires_both_severities() {
        let r = reconciler();
        let applied = r
            .apply(&SourceRecord::state("/A", &json!({"severity": "MAJOR"})))
            .unwrap();
        assert!(matches!(applied, Applied::Ignored(_)));

        let applied = r
            .apply(&SourceRecord::state("/A", &json!({"mode": "maintenance"})))
            .unwrap();
        assert!(matches!(applied, Applied::Ignored(_)));
        assert!(r.store().is_empty());
    }

    #[test]
    fn test_invalid_severity_leaves_store_untouched() {
        let r = reconciler();
        let result = r.apply(&SourceRecord::state(
            "/A/PV1",
            &json!({"severity": "SEVERE", "current_severity": "OK"}),
        ));
        assert!(matches!(result, Err(MonitorError::InvalidSeverity(ref t)) if t == "SEVERE"));
        assert!(r.store().is_empty());
    }

    #[test]
    fn test_malformed_payload() {
        let r = reconciler();
        let result = r.apply(&SourceRecord::new("config:/A/PV1", Some("{".into())));
        let err = result.unwrap_err();
        assert!(matches!(err, MonitorError::MalformedPayload { .. }));
        assert!(err.is_record_error());
        assert!(!MonitorError::AdapterFailure("down".into()).is_record_error());
    }

    #[test]
    fn test_timestamp_fallback() {
        let before = Utc::now();
        for time in [
            json!({"nano": 5}),
            json!({"seconds": "soon"}),
            json!({"seconds": 10, "nano": 2_000_000_000u64}),
        ] {
            let ts = timestamp(&json!({ "time": time }));
            assert!(ts >= before);
        }
        assert_eq!(timestamp(&json!({"time": {"seconds": 10}})).timestamp(), 10);
    }

    #[test]
    fn test_text_and_bool_coercion() {
        assert_eq!(as_text(&json!("x")), "x");
        assert_eq!(as_text(&json!(5)), "5");
        assert_eq!(as_text(&json!({"a": 1})), "");
        assert!(as_bool(&json!(true)));
        assert!(as_bool(&json!("true")));
        assert!(!as_bool(&json!("no")));
        assert!(as_bool(&json!(1)));
    }
}
