//! Repository for stored profile records.

use ideals_core::profile::{parse_profile_str, Profile};

use crate::error::StorageError;
use crate::keys;
use crate::kv::KeyValueStore;

/// Provides CRUD operations for profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Ids of every stored profile record, in key order.
    pub fn list_ids(store: &dyn KeyValueStore) -> Result<Vec<String>, StorageError> {
        let keys = store.keys(&keys::profile_key_prefix())?;
        Ok(keys
            .iter()
            .filter_map(|key| keys::profile_id_from_key(key))
            .map(str::to_string)
            .collect())
    }

    /// Load and validate a profile.
    ///
    /// Returns `None` when the record is absent or fails validation; corrupt
    /// records are logged and left in place.
    pub fn get(store: &dyn KeyValueStore, id: &str) -> Result<Option<Profile>, StorageError> {
        let Some(raw) = store.get(&keys::profile_key(id))? else {
            return Ok(None);
        };
        match parse_profile_str(&raw) {
            Ok(profile) if profile.id == id => Ok(Some(profile)),
            Ok(profile) => {
                tracing::warn!(
                    profile_id = %id,
                    stored_id = %profile.id,
                    "Stored profile id does not match its key",
                );
                Ok(None)
            }
            Err(e) => {
                tracing::error!(profile_id = %id, error = %e, "Unable to parse stored profile");
                Ok(None)
            }
        }
    }

    /// Write a profile under its own id, replacing any previous record.
    pub fn set(store: &dyn KeyValueStore, profile: &Profile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(profile)?;
        store.set(&keys::profile_key(&profile.id), &raw)
    }

    pub fn delete(store: &dyn KeyValueStore, id: &str) -> Result<(), StorageError> {
        store.remove(&keys::profile_key(id))
    }
}
