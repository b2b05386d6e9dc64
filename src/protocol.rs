//! Messages exchanged between the controller, the page agent and the
//! settings panel
//!
//! Wire shape follows the extension runtime: requests are tagged by an
//! `action` field and use camelCase payload keys.

use serde::{Deserialize, Serialize};

use crate::state::Settings;

/// A request sent over the runtime message channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    UpdateSettings {
        #[serde(rename = "isEnabled")]
        is_enabled: bool,
        interval: u32,
    },
    GetSettings,
    AutoSave,
    TimerUpdate {
        #[serde(rename = "remainingSeconds")]
        remaining_seconds: u64,
    },
}

/// Answer to `getSettings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub is_enabled: bool,
    pub interval: u32,
    pub remaining_seconds: u64,
}

impl SettingsSnapshot {
    pub fn new(settings: Settings, remaining_seconds: u64) -> Self {
        Self {
            is_enabled: settings.enabled,
            interval: settings.interval_minutes,
            remaining_seconds,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings::new(self.is_enabled, self.interval)
    }
}

/// Answer to `updateSettings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    pub success: bool,
}

impl UpdateAck {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Answer to `autoSave`. A disabled agent sends none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveResponse {
    pub success: bool,
}

/// One-way countdown broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdate {
    pub remaining_seconds: u64,
}

impl From<TimerUpdate> for RuntimeMessage {
    fn from(update: TimerUpdate) -> Self {
        RuntimeMessage::TimerUpdate {
            remaining_seconds: update.remaining_seconds,
        }
    }
}
