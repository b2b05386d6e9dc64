//! Durable key-value storage for the two persisted settings
//!
//! Stores keep the `isEnabled` and `interval` keys and notify subscribers
//! whenever a write actually changes one of them.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::state::{Settings, DEFAULT_INTERVAL_MINUTES};

/// Capacity of the change notification channel
const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored settings are not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Lock,
}

/// Raw stored values; either key may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(rename = "isEnabled", default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(rename = "interval", default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
}

impl StoredSettings {
    /// Apply defaults. A stored interval of zero counts as missing.
    pub fn resolve(&self) -> Settings {
        Settings::new(
            self.is_enabled.unwrap_or(false),
            self.interval
                .filter(|minutes| *minutes > 0)
                .unwrap_or(DEFAULT_INTERVAL_MINUTES),
        )
    }
}

impl From<Settings> for StoredSettings {
    fn from(settings: Settings) -> Self {
        Self {
            is_enabled: Some(settings.enabled),
            interval: Some(settings.interval_minutes),
        }
    }
}

/// Old and new value of one changed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange<T> {
    pub old_value: Option<T>,
    pub new_value: T,
}

/// Keys changed by a single write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageChange {
    pub is_enabled: Option<ValueChange<bool>>,
    pub interval: Option<ValueChange<u32>>,
}

impl StorageChange {
    /// Diff a write against the previous contents, `None` if nothing changed
    pub fn between(old: &StoredSettings, new: &StoredSettings) -> Option<Self> {
        let change = Self {
            is_enabled: diff_key(old.is_enabled, new.is_enabled),
            interval: diff_key(old.interval, new.interval),
        };
        if change.is_enabled.is_none() && change.interval.is_none() {
            None
        } else {
            Some(change)
        }
    }
}

fn diff_key<T: Copy + PartialEq>(old: Option<T>, new: Option<T>) -> Option<ValueChange<T>> {
    match new {
        Some(new_value) if old != Some(new_value) => Some(ValueChange {
            old_value: old,
            new_value,
        }),
        _ => None,
    }
}

/// Durable settings storage shared by the controller and page agents
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<StoredSettings, StoreError>;

    /// Persist both keys and notify subscribers of the keys that changed
    fn save(&self, settings: Settings) -> Result<(), StoreError>;

    /// Subscribe to change notifications
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Fan-out used by every store implementation
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    tx: broadcast::Sender<StorageChange>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, old: &StoredSettings, new: &StoredSettings) {
        if let Some(change) = StorageChange::between(old, new) {
            tracing::debug!("Publishing storage change: {:?}", change);
            // Nobody listening is fine
            let _ = self.tx.send(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_applies_defaults() {
        assert_eq!(StoredSettings::default().resolve(), Settings::default());
        let stored = StoredSettings {
            is_enabled: Some(true),
            interval: Some(0),
        };
        assert_eq!(stored.resolve(), Settings::new(true, 1));
    }

    #[test]
    fn change_only_lists_keys_that_differ() {
        let old = StoredSettings::from(Settings::new(false, 5));
        let new = StoredSettings::from(Settings::new(true, 5));
        let change = StorageChange::between(&old, &new).unwrap();
        assert_eq!(
            change.is_enabled,
            Some(ValueChange {
                old_value: Some(false),
                new_value: true
            })
        );
        assert_eq!(change.interval, None);
    }

    #[test]
    fn identical_write_is_not_a_change() {
        let stored = StoredSettings::from(Settings::new(true, 3));
        assert_eq!(StorageChange::between(&stored, &stored), None);
    }

    #[test]
    fn first_write_reports_missing_old_values() {
        let change = StorageChange::between(
            &StoredSettings::default(),
            &StoredSettings::from(Settings::default()),
        )
        .unwrap();
        assert_eq!(change.is_enabled.unwrap().old_value, None);
        assert_eq!(change.interval.unwrap().new_value, 1);
    }
}
