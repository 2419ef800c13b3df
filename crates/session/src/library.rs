//! The set of stored profiles and the active selection.

use ideals_core::error::CoreError;
use ideals_core::export::{export_file_name, export_profile_json};
use ideals_core::flags::ProfileFlag;
use ideals_core::id::generate_profile_id;
use ideals_core::profile::{parse_profile_str, Profile};
use ideals_core::validation::is_valid_url;
use ideals_storage::{ProfileIndex, ProfileIndexRepo, ProfileRepo, ProfileSummary, SharedStore};

use crate::error::SessionError;

/// How to import a profile whose id is already in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportResolution {
    /// Replace the stored profile.
    Overwrite,
    /// Keep both; the import gets a fresh id.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported {
        id: String,
        /// An existing profile with the same id was replaced.
        replaced: bool,
    },
    /// The id is taken and no resolution was given. Nothing was written.
    Conflict { id: String, existing_name: String },
}

/// A profile rendered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedProfile {
    pub file_name: String,
    pub contents: String,
}

/// Ordered list of stored profiles plus the active selection, persisted as
/// the profile index.
pub struct ProfileLibrary {
    store: SharedStore,
    index: ProfileIndex,
}

impl ProfileLibrary {
    /// Load the index, recovering it from the stored profiles if needed.
    pub fn open(store: SharedStore) -> Result<Self, SessionError> {
        let index = ProfileIndexRepo::load(store.as_ref())?;
        tracing::debug!(
            target: "ideals_session",
            profiles = index.profiles.len(),
            active = ?index.active,
            "Opened profile library",
        );
        Ok(Self { store, index })
    }

    pub fn profiles(&self) -> &[ProfileSummary] {
        &self.index.profiles
    }

    pub fn active_id(&self) -> Option<&str> {
        self.index.active.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Select a profile, or clear the selection with `None`.
    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), SessionError> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.index.active = id.map(str::to_string);
        self.save_index()
    }

    /// Create, store and activate an empty profile for a template.
    pub fn create_profile(
        &mut self,
        name: &str,
        template_id: &str,
        template_link: &str,
        flags: Vec<ProfileFlag>,
    ) -> Result<Profile, SessionError> {
        let template_link = template_link.trim();
        if !is_valid_url(template_link) {
            return Err(SessionError::InvalidUrl(template_link.to_string()));
        }
        let profile = Profile::new(name, template_id, template_link, flags);
        ProfileRepo::set(self.store.as_ref(), &profile)?;

        self.index.profiles.push(summary_of(&profile));
        self.index.active = Some(profile.id.clone());
        self.save_index()?;

        tracing::info!(target: "ideals_session", profile_id = %profile.id, name, "Created profile");
        Ok(profile)
    }

    /// Validate and store a profile document, then make it active.
    pub fn import_profile(
        &mut self,
        json: &str,
        resolution: Option<ImportResolution>,
    ) -> Result<ImportOutcome, SessionError> {
        let mut profile = parse_profile_str(json)?;

        let existing_name = self.index.get(&profile.id).map(|s| s.name.clone());
        let replaced = match (existing_name, resolution) {
            (None, _) => false,
            (Some(existing_name), None) => {
                return Ok(ImportOutcome::Conflict {
                    id: profile.id,
                    existing_name,
                });
            }
            (Some(_), Some(ImportResolution::Overwrite)) => true,
            (Some(_), Some(ImportResolution::Duplicate)) => {
                profile.id = generate_profile_id();
                false
            }
        };

        ProfileRepo::set(self.store.as_ref(), &profile)?;
        if replaced {
            self.index.remove(&profile.id);
        }
        self.index.profiles.push(summary_of(&profile));
        self.index.active = Some(profile.id.clone());
        self.save_index()?;

        tracing::info!(
            target: "ideals_session",
            profile_id = %profile.id,
            replaced,
            "Imported profile",
        );
        Ok(ImportOutcome::Imported {
            id: profile.id,
            replaced,
        })
    }

    /// Delete a profile. Deleting the active profile activates the first
    /// remaining one.
    pub fn delete_profile(&mut self, id: &str) -> Result<(), SessionError> {
        self.require(id)?;
        ProfileRepo::delete(self.store.as_ref(), id)?;
        self.index.remove(id);
        self.save_index()?;
        tracing::info!(target: "ideals_session", profile_id = id, "Deleted profile");
        Ok(())
    }

    /// Rename the stored profile and its index entry.
    ///
    /// The active session holds its own copy; callers with a loaded session
    /// rename through it as well (see [`Tracker`](crate::Tracker)).
    pub fn rename_profile(&mut self, id: &str, name: &str) -> Result<(), SessionError> {
        self.require(id)?;
        if let Some(mut profile) = ProfileRepo::get(self.store.as_ref(), id)? {
            profile.name = name.to_string();
            ProfileRepo::set(self.store.as_ref(), &profile)?;
        }
        self.index.upsert(ProfileSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self.save_index()
    }

    /// Render a stored profile as an export file.
    pub fn export_profile(&self, id: &str) -> Result<ExportedProfile, SessionError> {
        let profile = ProfileRepo::get(self.store.as_ref(), id)?.ok_or_else(|| not_found(id))?;
        Ok(ExportedProfile {
            file_name: export_file_name(&profile),
            contents: export_profile_json(&profile)?,
        })
    }

    // ---- private helpers ----

    pub(crate) fn require(&self, id: &str) -> Result<(), SessionError> {
        if self.index.contains(id) {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    fn save_index(&self) -> Result<(), SessionError> {
        Ok(ProfileIndexRepo::save(self.store.as_ref(), &self.index)?)
    }
}

fn summary_of(profile: &Profile) -> ProfileSummary {
    ProfileSummary {
        id: profile.id.clone(),
        name: profile.name.clone(),
    }
}

fn not_found(id: &str) -> SessionError {
    SessionError::Core(CoreError::NotFound {
        entity: "profile",
        id: id.to_string(),
    })
}
