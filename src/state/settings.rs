//! User-facing settings owned by the controller

use serde::{Deserialize, Serialize};

/// Interval used when nothing (or zero) is stored.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 1;

/// Smallest interval the controller accepts.
pub const MIN_INTERVAL_MINUTES: u32 = 1;

/// Auto-save settings: whether saving is on and how often it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "isEnabled")]
    pub enabled: bool,
    #[serde(rename = "interval")]
    pub interval_minutes: u32,
}

impl Settings {
    pub fn new(enabled: bool, interval_minutes: u32) -> Self {
        Self {
            enabled,
            interval_minutes,
        }
    }

    /// Countdown value right after a reset, in seconds
    pub fn full_countdown_seconds(&self) -> u64 {
        u64::from(self.interval_minutes) * 60
    }

    pub fn has_valid_interval(&self) -> bool {
        self.interval_minutes >= MIN_INTERVAL_MINUTES
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(false, DEFAULT_INTERVAL_MINUTES)
    }
}
