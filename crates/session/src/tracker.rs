//! Library and active session behind one handle.

use ideals_core::flags::ProfileFlag;
use ideals_core::profile::Profile;
use ideals_fetch::TemplateSource;
use ideals_storage::SharedStore;

use crate::active::ActiveProfile;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::library::{ImportOutcome, ImportResolution, ProfileLibrary};
use crate::state::LoadOutcome;

/// Application context owning the profile library and the active session.
///
/// Keeps the two consistent: changing the active profile flushes the
/// session and reloads, and library edits to the loaded profile are
/// mirrored into the session.
pub struct Tracker<S> {
    library: ProfileLibrary,
    session: ActiveProfile<S>,
}

impl<S: TemplateSource> Tracker<S> {
    pub fn open(source: S, store: SharedStore, config: SessionConfig) -> Result<Self, SessionError> {
        let library = ProfileLibrary::open(store.clone())?;
        let session = ActiveProfile::new(source, store, config);
        Ok(Self { library, session })
    }

    pub fn library(&self) -> &ProfileLibrary {
        &self.library
    }

    pub fn session(&self) -> &ActiveProfile<S> {
        &self.session
    }

    /// Load whatever the library has selected, or clear the session when
    /// nothing is.
    pub async fn load_active(&self) -> Result<Option<LoadOutcome>, SessionError> {
        match self.library.active_id() {
            Some(id) => {
                let id = id.to_string();
                self.session.load(&id).await.map(Some)
            }
            None => {
                self.session.clear();
                Ok(None)
            }
        }
    }

    /// Select `id` and load it.
    pub async fn switch_to(&mut self, id: &str) -> Result<LoadOutcome, SessionError> {
        self.session.flush()?;
        self.library.set_active(Some(id))?;
        self.session.load(id).await
    }

    pub async fn create_profile(
        &mut self,
        name: &str,
        template_id: &str,
        template_link: &str,
        flags: Vec<ProfileFlag>,
    ) -> Result<(Profile, LoadOutcome), SessionError> {
        self.session.flush()?;
        let profile = self
            .library
            .create_profile(name, template_id, template_link, flags)?;
        let outcome = self.session.load(&profile.id).await?;
        Ok((profile, outcome))
    }

    /// Import a profile document; a successful import is loaded.
    pub async fn import_profile(
        &mut self,
        json: &str,
        resolution: Option<ImportResolution>,
    ) -> Result<(ImportOutcome, Option<LoadOutcome>), SessionError> {
        // The session may hold unsaved edits to the profile being replaced.
        self.session.flush()?;
        let outcome = self.library.import_profile(json, resolution)?;
        let loaded = match &outcome {
            ImportOutcome::Imported { id, .. } => Some(self.session.load(id).await?),
            ImportOutcome::Conflict { .. } => None,
        };
        Ok((outcome, loaded))
    }

    /// Delete a profile. Deleting the loaded profile clears the session and
    /// loads the next active one.
    pub async fn delete_profile(&mut self, id: &str) -> Result<Option<LoadOutcome>, SessionError> {
        self.library.require(id)?;
        let was_loaded = self.session.profile_id().as_deref() == Some(id);
        if was_loaded {
            self.session.clear();
        }
        self.library.delete_profile(id)?;
        if was_loaded {
            return self.load_active().await;
        }
        Ok(None)
    }

    pub fn rename_profile(&mut self, id: &str, name: &str) -> Result<(), SessionError> {
        if self.session.profile_id().as_deref() == Some(id) {
            self.session.rename(name)?;
            self.session.flush()?;
        }
        self.library.rename_profile(id, name)
    }

    /// Write pending edits; call before shutdown.
    pub fn flush(&self) -> Result<(), SessionError> {
        self.session.flush()
    }
}
