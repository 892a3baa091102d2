//! Load/save of the profile and settings records
//!
//! Features:
//! - One JSON record per key, always written whole
//! - Missing fields fall back to their defaults
//! - Corrupt or unreadable records fall back entirely to defaults

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::platform::storage::{KeyValueStore, StorageError};
use crate::profile::Profile;
use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Typed records over a key-value store
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored profile, repaired so the leveling invariant holds
    pub fn load_profile(&self) -> Profile {
        let mut profile: Profile = self.load_or_default(Profile::STORAGE_KEY, "profile");
        profile.normalize();
        profile
    }

    pub fn save_profile(&mut self, profile: &Profile) -> Result<(), PersistenceError> {
        self.save(Profile::STORAGE_KEY, profile)?;
        log::debug!("Profile saved (lvl {}, xp {})", profile.level, profile.xp);
        Ok(())
    }

    pub fn load_settings(&self) -> Settings {
        self.load_or_default(Settings::STORAGE_KEY, "settings")
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
        self.save(Settings::STORAGE_KEY, settings)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Overwrite the stored profile with first-launch defaults
    pub fn reset_profile(&mut self) -> Result<Profile, PersistenceError> {
        let profile = Profile::default();
        self.save(Profile::STORAGE_KEY, &profile)?;
        log::info!("Progress reset");
        Ok(profile)
    }

    fn load_or_default<T>(&self, key: &str, what: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.store.get(key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    log::info!("Loaded {} from storage", what);
                    value
                }
                Err(e) => {
                    log::warn!("Stored {} is unreadable ({}), using defaults", what, e);
                    T::default()
                }
            },
            Ok(None) => {
                log::info!("No stored {}, using defaults", what);
                T::default()
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", what, e);
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)?;
        Ok(())
    }
}
