//! Event source replaying a recorded stream from JSON lines
//!
//! Each line holds one record:
//!
//! ```text
//! {"key": "config:/Area/PV1", "value": {"description": "Pump"}}
//! {"key": "state:/Area/PV1", "value": "{\"severity\":\"MAJOR\",\"current_severity\":\"MAJOR\"}"}
//! {"key": "config:/Area/PV1", "value": null}
//! ```
//!
//! `value` may be a JSON object, a string holding the raw payload, or `null`
//! for a deletion. Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use super::EventSource;
use crate::error::{MonitorError, MonitorResult};
use crate::record::SourceRecord;

/// Maximum records returned by one poll
const MAX_BATCH: usize = 500;

#[derive(Debug, Deserialize)]
struct ReplayLine {
    key: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    partition: i32,
}

/// Event source reading recorded records
pub struct ReplaySource {
    name: String,
    reader: Option<Box<dyn BufRead + Send>>,
    line_no: i64,
    exhausted: bool,
}

impl ReplaySource {
    /// Replay a file
    pub fn open(path: &Path) -> MonitorResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
        ))
    }

    /// Replay any buffered reader
    pub fn from_reader(name: impl Into<String>, reader: impl BufRead + Send + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Some(Box::new(reader)),
            line_no: 0,
            exhausted: false,
        }
    }

    /// All records have been delivered
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn parse_line(&self, line: &str) -> Result<SourceRecord, serde_json::Error> {
        let parsed: ReplayLine = serde_json::from_str(line)?;
        let value = match parsed.value {
            Value::Null => None,
            Value::String(raw) => Some(raw),
            other => Some(other.to_string()),
        };
        let topic = parsed.topic.unwrap_or_else(|| self.name.clone());
        Ok(SourceRecord::new(parsed.key, value).at(topic, parsed.partition, self.line_no))
    }
}

impl EventSource for ReplaySource {
    fn poll(&mut self, timeout: Duration) -> MonitorResult<Vec<SourceRecord>> {
        if self.exhausted || self.reader.is_none() {
            thread::sleep(timeout);
            return Ok(Vec::new());
        }

        let mut batch = Vec::new();
        let mut line = String::new();
        while batch.len() < MAX_BATCH {
            line.clear();
            let read = match self.reader.as_mut() {
                Some(reader) => reader
                    .read_line(&mut line)
                    .map_err(|e| MonitorError::AdapterFailure(format!("{}: {e}", self.name)))?,
                None => 0,
            };
            if read == 0 {
                info!("Replay of '{}' complete after {} lines", self.name, self.line_no);
                self.exhausted = true;
                break;
            }
            self.line_no += 1;

            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            match self.parse_line(text) {
                Ok(record) => batch.push(record),
                Err(e) => warn!("Skipping {} line {}: {}", self.name, self.line_no, e),
            }
        }
        Ok(batch)
    }

    fn close(&mut self) {
        self.reader = None;
    }

    fn describe(&self) -> String {
        format!("replay of '{}'", self.name)
    }
}
