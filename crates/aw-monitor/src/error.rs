//! Error types for the alarm monitor

use aw_core::AwError;
use thiserror::Error;

/// Monitor error type
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Malformed payload for '{key}': {source}")]
    MalformedPayload {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("Event source failure: {0}")]
    AdapterFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Errors that concern a single record rather than the source
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. } | Self::InvalidSeverity(_)
        )
    }
}

impl From<AwError> for MonitorError {
    fn from(err: AwError) -> Self {
        match err {
            AwError::InvalidSeverity(token) => Self::InvalidSeverity(token),
        }
    }
}

/// Result type alias
pub type MonitorResult<T> = Result<T, MonitorError>;
