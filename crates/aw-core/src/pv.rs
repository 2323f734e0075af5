//! Alarm PV: one leaf of the alarm tree
//!
//! An [`AlarmPv`] is a value. The monitor never edits a published PV in
//! place; it derives a new one (`with_description`, `with_alarm`) and
//! publishes that, so concurrent readers always see a complete snapshot.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::path;
use crate::severity::{Membership, SeverityLevel};

/// Message of a PV that is not in alarm
pub const OK_MESSAGE: &str = "OK";

/// Timestamp format of the JSON view (local time, millisecond precision)
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Alarm fields delivered by one `state:` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmUpdate {
    pub severity: SeverityLevel,
    pub message: String,
    pub current_severity: SeverityLevel,
    pub current_message: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of one alarm PV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPv {
    path: String,
    description: String,
    severity: SeverityLevel,
    current_severity: SeverityLevel,
    message: String,
    current_message: String,
    value: String,
    timestamp: DateTime<Utc>,
}

impl AlarmPv {
    /// New PV in the normal state, described by its display name
    pub fn new(path: impl Into<String>) -> Self {
        Self::at(path, Utc::now())
    }

    /// New PV in the normal state with an explicit creation time
    pub fn at(path: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let path = path.into();
        let description = path::name(&path).to_string();
        Self {
            path,
            description,
            severity: SeverityLevel::Ok,
            current_severity: SeverityLevel::Ok,
            message: OK_MESSAGE.to_string(),
            current_message: OK_MESSAGE.to_string(),
            value: String::new(),
            timestamp,
        }
    }

    /// Same PV with a new description
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self.clone()
        }
    }

    /// Same PV with the alarm fields of a state update
    pub fn with_alarm(&self, update: AlarmUpdate) -> Self {
        Self {
            path: self.path.clone(),
            description: self.description.clone(),
            severity: update.severity,
            current_severity: update.current_severity,
            message: update.message,
            current_message: update.current_message,
            value: update.value,
            timestamp: update.timestamp,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Display name (last path segment)
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Latched alarm severity
    pub fn severity(&self) -> SeverityLevel {
        self.severity
    }

    /// Severity of the PV right now, which may differ from the latched one
    pub fn current_severity(&self) -> SeverityLevel {
        self.current_severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn current_message(&self) -> &str {
        &self.current_message
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Alarm list this snapshot belongs to
    pub fn membership(&self) -> Membership {
        self.severity.membership()
    }

    /// Serializable view used by the alarms JSON document
    pub fn to_json(&self) -> AlarmPvJson {
        AlarmPvJson {
            path: self.path.clone(),
            name: self.name().to_string(),
            description: self.description.clone(),
            severity: self.severity,
            message: self.message.clone(),
            current_severity: self.current_severity,
            current_message: self.current_message.clone(),
            value: self.value.clone(),
            time: self
                .timestamp
                .with_timezone(&Local)
                .format(TIME_FORMAT)
                .to_string(),
        }
    }
}

impl fmt::Display for AlarmPv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}/{}",
            self.name(),
            self.description,
            self.severity,
            self.message
        )
    }
}

/// JSON form of an [`AlarmPv`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPvJson {
    pub path: String,
    pub name: String,
    pub description: String,
    pub severity: SeverityLevel,
    pub message: String,
    pub current_severity: SeverityLevel,
    pub current_message: String,
    pub value: String,
    pub time: String,
}
