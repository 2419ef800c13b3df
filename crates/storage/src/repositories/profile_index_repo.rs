//! Repository for the profile index: the ordered list of known profiles and
//! the active selection.
//!
//! The index is derived data. When it is missing or unreadable it is rebuilt
//! by scanning the profile records, and a readable index is reconciled
//! against them on every load so it never lists a profile that is gone or
//! hides one that exists.

use serde::{Deserialize, Serialize};

use ideals_core::id::is_valid_profile_id;

use crate::error::StorageError;
use crate::keys;
use crate::kv::KeyValueStore;
use crate::repositories::profile_repo::ProfileRepo;

/// Display entry for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileIndex {
    pub active: Option<String>,
    pub profiles: Vec<ProfileSummary>,
}

impl ProfileIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.profiles.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&ProfileSummary> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Insert or replace the entry for `summary.id`, keeping its position.
    pub fn upsert(&mut self, summary: ProfileSummary) {
        match self.profiles.iter_mut().find(|p| p.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.profiles.push(summary),
        }
    }

    /// Remove an entry. A removed active profile hands the selection to the
    /// first remaining entry.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        let removed = self.profiles.len() != before;
        if self.active.as_deref() == Some(id) {
            self.active = self.first_id();
        }
        removed
    }

    fn first_id(&self) -> Option<String> {
        self.profiles.first().map(|p| p.id.clone())
    }

    fn is_well_formed(&self) -> bool {
        self.profiles.iter().all(|p| is_valid_profile_id(&p.id))
    }
}

pub struct ProfileIndexRepo;

impl ProfileIndexRepo {
    /// Load the index, rebuilding or reconciling it against stored profiles.
    ///
    /// The result is persisted whenever it differs from what was stored.
    pub fn load(store: &dyn KeyValueStore) -> Result<ProfileIndex, StorageError> {
        let stored = Self::read(store)?;
        let index = match &stored {
            Some(index) => Self::reconcile(store, index.clone())?,
            None => {
                tracing::info!("No valid profile index found, rebuilding from stored profiles");
                Self::rebuild(store)?
            }
        };
        if stored.as_ref() != Some(&index) {
            Self::save(store, &index)?;
        }
        Ok(index)
    }

    pub fn save(store: &dyn KeyValueStore, index: &ProfileIndex) -> Result<(), StorageError> {
        let raw = serde_json::to_string(index)?;
        store.set(&keys::profile_index_key(), &raw)
    }

    /// Stored index, or `None` when absent or corrupt.
    fn read(store: &dyn KeyValueStore) -> Result<Option<ProfileIndex>, StorageError> {
        let Some(raw) = store.get(&keys::profile_index_key())? else {
            return Ok(None);
        };
        match serde_json::from_str::<ProfileIndex>(&raw) {
            Ok(index) if index.is_well_formed() => Ok(Some(index)),
            Ok(_) => {
                tracing::error!("Profile index contains malformed profile ids");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to parse profile index");
                Ok(None)
            }
        }
    }

    /// Build an index from every readable profile record. Unreadable records
    /// are skipped.
    fn rebuild(store: &dyn KeyValueStore) -> Result<ProfileIndex, StorageError> {
        let mut index = ProfileIndex::default();
        for id in ProfileRepo::list_ids(store)? {
            if let Some(profile) = ProfileRepo::get(store, &id)? {
                index.profiles.push(ProfileSummary {
                    id: profile.id,
                    name: profile.name,
                });
            }
        }
        index.active = index.first_id();
        tracing::info!(profiles = index.profiles.len(), "Rebuilt profile index");
        Ok(index)
    }

    /// Drop entries without a record, append unrecorded profiles and fix a
    /// dangling active id.
    fn reconcile(store: &dyn KeyValueStore, mut index: ProfileIndex) -> Result<ProfileIndex, StorageError> {
        let mut existing = ProfileRepo::list_ids(store)?;

        index.profiles.retain(|entry| {
            match existing.iter().position(|id| *id == entry.id) {
                Some(pos) => {
                    existing.remove(pos);
                    true
                }
                None => {
                    tracing::warn!(profile_id = %entry.id, "Missing expected profile");
                    false
                }
            }
        });

        for id in existing {
            if let Some(profile) = ProfileRepo::get(store, &id)? {
                tracing::info!(profile_id = %id, "Found unrecorded profile");
                index.profiles.push(ProfileSummary {
                    id: profile.id,
                    name: profile.name,
                });
            }
        }

        let active_valid = index
            .active
            .as_deref()
            .is_some_and(|active| index.contains(active));
        if !active_valid {
            index.active = index.first_id();
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use ideals_core::profile::Profile;

    fn stored_profile(store: &MemoryStore, name: &str) -> Profile {
        let p = Profile::new(name, "tmpl", "https://example.com/t.json", vec![]);
        ProfileRepo::set(store, &p).unwrap();
        p
    }

    fn summary(p: &Profile) -> ProfileSummary {
        ProfileSummary {
            id: p.id.clone(),
            name: p.name.clone(),
        }
    }

    #[test]
    fn empty_store_yields_empty_index() {
        let store = MemoryStore::new();
        let index = ProfileIndexRepo::load(&store).unwrap();
        assert_eq!(index, ProfileIndex::default());
        assert!(store.get(&keys::profile_index_key()).unwrap().is_some());
    }

    #[test]
    fn missing_index_is_rebuilt_from_profiles() {
        let store = MemoryStore::new();
        let a = stored_profile(&store, "A");
        let b = stored_profile(&store, "B");
        store.set(&keys::profile_key("V1StGXR8_Z5jdHi6B-myT"), "garbage").unwrap();

        let index = ProfileIndexRepo::load(&store).unwrap();
        assert_eq!(index.profiles.len(), 2);
        assert!(index.contains(&a.id));
        assert!(index.contains(&b.id));
        assert_eq!(index.active.as_deref(), Some(index.profiles[0].id.as_str()));
    }

    #[test]
    fn corrupt_index_is_rebuilt_and_persisted() {
        let store = MemoryStore::new();
        let a = stored_profile(&store, "A");
        store.set(&keys::profile_index_key(), "{not json").unwrap();

        let index = ProfileIndexRepo::load(&store).unwrap();
        assert_eq!(index.profiles, vec![summary(&a)]);

        let raw = store.get(&keys::profile_index_key()).unwrap().unwrap();
        let persisted: ProfileIndex = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, index);
    }

    #[test]
    fn valid_index_is_reconciled() {
        let store = MemoryStore::new();
        let a = stored_profile(&store, "A");
        let b = stored_profile(&store, "B");
        let gone = "V1StGXR8_Z5jdHi6B-myT".to_string();
        ProfileIndexRepo::save(
            &store,
            &ProfileIndex {
                active: Some(gone.clone()),
                profiles: vec![
                    summary(&b),
                    ProfileSummary {
                        id: gone,
                        name: "Gone".into(),
                    },
                ],
            },
        )
        .unwrap();

        let index = ProfileIndexRepo::load(&store).unwrap();
        assert_eq!(index.profiles, vec![summary(&b), summary(&a)]);
        assert_eq!(index.active, Some(b.id.clone()));
    }

    #[test]
    fn unchanged_index_is_not_rewritten() {
        let store = MemoryStore::new();
        let a = stored_profile(&store, "A");
        ProfileIndexRepo::load(&store).unwrap();
        let writes = store.write_count();

        let index = ProfileIndexRepo::load(&store).unwrap();
        assert_eq!(index.active, Some(a.id));
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn removing_active_entry_selects_first() {
        let mut index = ProfileIndex {
            active: Some("b".into()),
            profiles: vec![
                ProfileSummary { id: "a".into(), name: "A".into() },
                ProfileSummary { id: "b".into(), name: "B".into() },
            ],
        };
        assert!(index.remove("b"));
        assert_eq!(index.active.as_deref(), Some("a"));
        assert!(index.remove("a"));
        assert_eq!(index.active, None);
        assert!(!index.remove("a"));
    }

    #[test]
    fn upsert_keeps_position() {
        let mut index = ProfileIndex::default();
        index.upsert(ProfileSummary { id: "a".into(), name: "A".into() });
        index.upsert(ProfileSummary { id: "b".into(), name: "B".into() });
        index.upsert(ProfileSummary { id: "a".into(), name: "A2".into() });
        assert_eq!(index.profiles[0].name, "A2");
        assert_eq!(index.profiles.len(), 2);
    }
}
