//! Observable settings state.
//!
//! `SettingsSnapshot` is what the rest of the system may see of the
//! settings machine: the provenance status and the date of the document
//! currently applied.  It is copied out on every transition.

use super::SettingsStatus;

/// Placeholder published for `settings-date` while nothing is applied.
pub const NULL_DATE: &str = "- - -";

/// A point-in-time copy of the settings state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub status: SettingsStatus,
    /// Seconds since the Unix epoch; `None` while nothing is applied.
    pub last_applied_at: Option<u64>,
}

impl SettingsSnapshot {
    /// The state at process start.
    pub const fn initial() -> Self {
        Self {
            status: SettingsStatus::None,
            last_applied_at: None,
        }
    }

    /// `settings-date` value as published in `DATA`.
    pub fn settings_date(&self) -> String {
        match self.last_applied_at {
            Some(secs) => secs.to_string(),
            None => NULL_DATE.to_owned(),
        }
    }
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
