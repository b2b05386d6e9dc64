//! In-memory settings store

use std::sync::Mutex;

use tokio::sync::broadcast;

use super::{ChangeFeed, SettingsStore, StorageChange, StoreError, StoredSettings};
use crate::state::Settings;

/// Store that lives as long as the process. Used when no settings file is
/// configured, and by tests.
#[derive(Debug)]
pub struct MemoryStore {
    values: Mutex<StoredSettings>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_values(StoredSettings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self::with_values(settings.into())
    }

    pub fn with_values(values: StoredSettings) -> Self {
        Self {
            values: Mutex::new(values),
            feed: ChangeFeed::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<StoredSettings, StoreError> {
        self.values
            .lock()
            .map(|values| *values)
            .map_err(|_| StoreError::Lock)
    }

    fn save(&self, settings: Settings) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Lock)?;
        let new_values = StoredSettings::from(settings);
        let old_values = std::mem::replace(&mut *values, new_values);
        drop(values);

        self.feed.publish(&old_values, &new_values);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}
