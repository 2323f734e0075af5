//! Alarm severity levels
//!
//! Levels come in two flavors. The plain abnormal levels (`MINOR`, `MAJOR`,
//! `INVALID`, `UNDEFINED`) are *active*: the operator has not acknowledged
//! them yet. The `*_ACK` levels are still abnormal but already acknowledged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AwError, AwResult};

/// Alarm severity as carried in `state:` records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    #[default]
    Ok,
    MinorAck,
    MajorAck,
    InvalidAck,
    UndefinedAck,
    Minor,
    Major,
    Invalid,
    Undefined,
}

impl SeverityLevel {
    /// All levels, in wire order
    pub const ALL: [SeverityLevel; 9] = [
        Self::Ok,
        Self::MinorAck,
        Self::MajorAck,
        Self::InvalidAck,
        Self::UndefinedAck,
        Self::Minor,
        Self::Major,
        Self::Invalid,
        Self::Undefined,
    ];

    /// Wire token, e.g. `"MAJOR_ACK"`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::MinorAck => "MINOR_ACK",
            Self::MajorAck => "MAJOR_ACK",
            Self::InvalidAck => "INVALID_ACK",
            Self::UndefinedAck => "UNDEFINED_ACK",
            Self::Minor => "MINOR",
            Self::Major => "MAJOR",
            Self::Invalid => "INVALID",
            Self::Undefined => "UNDEFINED",
        }
    }

    /// Abnormal and not yet acknowledged
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Minor | Self::Major | Self::Invalid | Self::Undefined
        )
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Which derived alarm list a PV at this severity belongs to
    pub fn membership(self) -> Membership {
        if self.is_active() {
            Membership::Active
        } else if !self.is_ok() {
            Membership::Acknowledged
        } else {
            Membership::Normal
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = AwError;

    fn from_str(token: &str) -> AwResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == token)
            .ok_or_else(|| AwError::InvalidSeverity(token.to_string()))
    }
}

/// Derived alarm list membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    /// Abnormal, needs acknowledgment
    Active,
    /// Abnormal, acknowledged but not cleared
    Acknowledged,
    /// Normal
    Normal,
}
