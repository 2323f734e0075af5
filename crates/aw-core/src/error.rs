//! Error types for Alarm Webmon domain values

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwError {
    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),
}

/// Result type alias
pub type AwResult<T> = Result<T, AwError>;
