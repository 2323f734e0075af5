//! aw-core: Shared types for Alarm Webmon
//!
//! Domain vocabulary used by the monitor and its hosts:
//! - [`SeverityLevel`]: alarm levels with the active/acknowledged split
//! - [`AlarmPv`]: immutable snapshot of one alarm tree leaf (a "PV")
//! - [`path`]: alarm tree path helpers
//! - [`AwError`]: errors raised while decoding domain values

mod error;
mod pv;
mod severity;

pub mod path;

pub use error::*;
pub use pv::*;
pub use severity::*;
