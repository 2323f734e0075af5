//! Alarm tree path helpers
//!
//! Paths look like `/Accelerator/Vacuum/PV1`. Only the display name is
//! derived here; hierarchy is not modeled.

/// Path separator
pub const SEPARATOR: char = '/';

/// Display name of a path: its last non-empty segment.
///
/// Falls back to the full path when it has no segments.
pub fn name(path: &str) -> &str {
    path.rsplit(SEPARATOR)
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}
