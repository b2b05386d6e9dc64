//! JSON file backed settings store

use std::{fs, io::ErrorKind, path::PathBuf, sync::Mutex};

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{ChangeFeed, SettingsStore, StorageChange, StoreError, StoredSettings};
use crate::state::Settings;

/// Store persisting `{"isEnabled": .., "interval": ..}` to a single file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
    feed: ChangeFeed,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using settings file {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
            feed: ChangeFeed::new(),
        }
    }

    fn read(&self) -> Result<StoredSettings, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Settings file {} does not exist yet", self.path.display());
                Ok(StoredSettings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, values: &StoredSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target then rename so readers never see half a file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<StoredSettings, StoreError> {
        self.read()
    }

    /// Blocking write of a two-key file. Called from the controller task;
    /// the file is small enough that the write stays short.
    fn save(&self, settings: Settings) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Lock)?;

        // An unreadable previous file is replaced; every key then counts as changed
        let old_values = self.read().unwrap_or_default();
        let new_values = StoredSettings::from(settings);
        self.write(&new_values)?;
        debug!("Saved settings {:?} to {}", settings, self.path.display());

        self.feed.publish(&old_values, &new_values);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}
