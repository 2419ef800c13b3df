//! The active profile session.
//!
//! [`ActiveProfile::load`] drives the reconciliation state machine:
//!
//! 1. flush pending writes, cancel the previous load, enter `Loading`;
//! 2. read the profile (missing or invalid: `Error`);
//! 3. expose the cached template, if any, while fetching;
//! 4. fetch the template; on failure fall back to the cached copy or
//!    enter `Error` with the profile still exposed;
//! 5. compare revisions and either do nothing, sync silently, or stop in
//!    `NeedsConfirmation` with the diff.
//!
//! Every sync is persisted before the in-memory state adopts it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use ideals_core::diff::{diff_profile_with_template, ProfileTemplateDiff};
use ideals_core::profile::Profile;
use ideals_core::sync::{sync_profile_with_template, SyncPolicy};
use ideals_core::template::Template;
use ideals_core::validation::is_valid_url;
use ideals_fetch::{FetchError, TemplateSource};
use ideals_storage::{keys, CoalescingWriter, ProfileRepo, SharedStore, TemplateCacheRepo};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::state::{LoadError, LoadOutcome, LoadStatus, SessionSnapshot, SessionState};

/// Session for the profile currently being viewed and edited.
pub struct ActiveProfile<S> {
    source: S,
    store: SharedStore,
    writer: CoalescingWriter,
    config: SessionConfig,
    state: Mutex<SessionState>,
    /// Bumped by every `load` and `clear`; a load only applies results while
    /// its generation is still current.
    generation: AtomicU64,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<S: TemplateSource> ActiveProfile<S> {
    pub fn new(source: S, store: SharedStore, config: SessionConfig) -> Self {
        let writer = CoalescingWriter::new(store.clone(), config.save_debounce);
        Self {
            source,
            store,
            writer,
            config,
            state: Mutex::new(SessionState::default()),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.state())
    }

    pub fn status(&self) -> LoadStatus {
        self.state().status()
    }

    /// Id of the exposed profile, if any.
    pub fn profile_id(&self) -> Option<String> {
        self.state().profile.as_ref().map(|p| p.id.clone())
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load `profile_id` and reconcile it with its template.
    ///
    /// Load failures are recorded in the session state and reported as
    /// [`LoadOutcome::Failed`]; `Err` is reserved for storage failures while
    /// persisting a sync.
    pub async fn load(&self, profile_id: &str) -> Result<LoadOutcome, SessionError> {
        self.flush_logged();
        let (generation, cancel) = self.begin_load();
        *self.state() = SessionState::loading();
        tracing::info!(target: "ideals_session", profile_id, generation, "Loading profile");

        let profile = match ProfileRepo::get(self.store.as_ref(), profile_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                let err = LoadError::Profile {
                    profile_id: profile_id.to_string(),
                    message: format!("Unable to load profile {profile_id}"),
                };
                return Ok(self.fail(generation, err, None));
            }
            Err(e) => {
                let err = LoadError::Profile {
                    profile_id: profile_id.to_string(),
                    message: e.to_string(),
                };
                return Ok(self.fail(generation, err, None));
            }
        };

        let cached = self.cached_template(&profile.template.id);
        if let Some(template) = &cached {
            let mut state = self.state();
            if self.is_current(generation) {
                tracing::debug!(
                    target: "ideals_session",
                    template_id = %template.id,
                    revision = template.revision,
                    "Showing cached template while fetching",
                );
                state.profile = Some(profile.clone());
                state.template = Some(template.clone());
            }
        }

        let fetched = self
            .source
            .fetch_template(&profile.template.link, Some(&profile.template.id), &cancel)
            .await;

        if !self.is_current(generation) {
            return Ok(LoadOutcome::Superseded);
        }

        let (template, stale) = match fetched {
            Ok(template) => {
                if cached.as_ref() != Some(&template) {
                    self.cache_template(&template);
                }
                (template, false)
            }
            Err(FetchError::Cancelled) => return Ok(LoadOutcome::Superseded),
            Err(FetchError::Template(e)) => match cached {
                Some(template) => {
                    tracing::warn!(
                        target: "ideals_session",
                        profile_id,
                        error = %e,
                        "Template fetch failed, using cached template",
                    );
                    (template, true)
                }
                None => return Ok(self.fail(generation, LoadError::Template(e), Some(profile))),
            },
        };

        let mut state = self.state();
        if !self.is_current(generation) {
            return Ok(LoadOutcome::Superseded);
        }

        // Keep edits made against the cached template during the fetch.
        let base = state
            .profile
            .take()
            .filter(|p| p.id == profile.id)
            .unwrap_or(profile);
        let reconciled = reconcile(&base, &template);

        if let Some(synced) = &reconciled.synced {
            let persisted = self
                .writer
                .cancel(&keys::profile_key(&synced.id))
                .and_then(|_| ProfileRepo::set(self.store.as_ref(), synced));
            if let Err(e) = persisted {
                tracing::error!(
                    target: "ideals_session",
                    profile_id = %synced.id,
                    error = %e,
                    "Failed to persist synced profile",
                );
                // The pending edit write may already be gone; queue the kept profile again.
                if let Err(e) = self.writer.schedule_profile(&base) {
                    tracing::warn!(
                        target: "ideals_session",
                        profile_id = %base.id,
                        error = %e,
                        "Failed to reschedule profile write",
                    );
                }
                state.profile = Some(base);
                state.template = Some(template);
                state.template_is_stale = stale;
                state.loading = false;
                return Err(e.into());
            }
        }

        let synced = reconciled.synced.is_some();
        let outcome = if reconciled.pending_sync {
            LoadOutcome::NeedsConfirmation
        } else {
            LoadOutcome::Ready { synced }
        };

        tracing::info!(
            target: "ideals_session",
            profile_id = %base.id,
            profile_name = %base.name,
            template_revision = template.revision,
            synced,
            pending_sync = reconciled.pending_sync,
            stale,
            "Loaded profile",
        );

        state.profile = Some(reconciled.synced.unwrap_or(base));
        state.template = Some(template);
        state.changes = reconciled.changes;
        state.pending_sync = reconciled.pending_sync;
        state.template_is_stale = stale;
        state.error = None;
        state.loading = false;
        Ok(outcome)
    }

    /// Apply the pending sync with `policy`, or dismiss the diff when no
    /// sync is pending. Returns whether a sync was applied.
    pub fn confirm_sync(&self, policy: SyncPolicy) -> Result<bool, SessionError> {
        let mut guard = self.state();
        let state = &mut *guard;
        let (Some(profile), Some(template)) = (&state.profile, &state.template) else {
            return Ok(false);
        };
        if !state.pending_sync {
            state.changes = None;
            return Ok(false);
        }

        let synced = sync_profile_with_template(profile, template, policy);
        self.writer.cancel(&keys::profile_key(&synced.id))?;
        ProfileRepo::set(self.store.as_ref(), &synced)?;
        tracing::info!(
            target: "ideals_session",
            profile_id = %synced.id,
            policy = %policy,
            revision = synced.template.revision,
            "Applied confirmed sync",
        );

        state.profile = Some(synced);
        state.changes = None;
        state.pending_sync = false;
        Ok(true)
    }

    /// Flush pending writes, abort any in-flight load and reset to `Idle`.
    pub fn clear(&self) {
        self.flush_logged();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.in_flight().take() {
            token.cancel();
        }
        *self.state() = SessionState::default();
    }

    /// Write pending edits now.
    pub fn flush(&self) -> Result<(), SessionError> {
        Ok(self.writer.flush()?)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Flip an item's done flag. Rejected in count mode.
    pub fn toggle_item(&self, collection_id: &str, item_id: &str) -> Result<bool, SessionError> {
        self.mutate(|profile| Ok(profile.toggle_item(collection_id, item_id)?))
    }

    /// Record a count. Only valid in count mode.
    pub fn set_count(&self, collection_id: &str, item_id: &str, count: u64) -> Result<(), SessionError> {
        self.mutate(|profile| Ok(profile.set_count(collection_id, item_id, count)?))
    }

    pub fn toggle_member(&self, member_id: &str) -> Result<bool, SessionError> {
        self.mutate(|profile| Ok(profile.toggle_member(member_id)))
    }

    pub fn rename(&self, name: &str) -> Result<(), SessionError> {
        self.mutate(|profile| {
            profile.name = name.to_string();
            Ok(())
        })
    }

    /// Point the profile at a different template URL. Takes effect on the
    /// next load.
    pub fn update_template_url(&self, url: &str) -> Result<(), SessionError> {
        let url = url.trim();
        if !is_valid_url(url) {
            return Err(SessionError::InvalidUrl(url.to_string()));
        }
        self.mutate(|profile| {
            profile.template.link = url.to_string();
            tracing::debug!(target: "ideals_session", profile_id = %profile.id, url, "Template link updated");
            Ok(())
        })
    }

    // ---- private helpers ----

    fn mutate<T>(&self, f: impl FnOnce(&mut Profile) -> Result<T, SessionError>) -> Result<T, SessionError> {
        let mut state = self.state();
        let profile = state.profile.as_mut().ok_or(SessionError::NoProfile)?;
        let result = f(profile)?;
        self.writer.schedule_profile(profile)?;
        Ok(result)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_load(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight().replace(token.clone()) {
            previous.cancel();
        }
        (generation, token)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn fail(&self, generation: u64, error: LoadError, profile: Option<Profile>) -> LoadOutcome {
        let mut state = self.state();
        if !self.is_current(generation) {
            return LoadOutcome::Superseded;
        }
        tracing::warn!(target: "ideals_session", error = %error, "Load failed");
        *state = SessionState {
            profile,
            error: Some(error),
            ..SessionState::default()
        };
        LoadOutcome::Failed
    }

    fn flush_logged(&self) {
        if let Err(e) = self.writer.flush() {
            tracing::error!(target: "ideals_session", error = %e, "Failed to flush pending writes");
        }
    }

    fn cached_template(&self, template_id: &str) -> Option<Template> {
        if !self.config.template_cache {
            return None;
        }
        TemplateCacheRepo::get(self.store.as_ref(), template_id).unwrap_or_else(|e| {
            tracing::warn!(target: "ideals_session", template_id, error = %e, "Template cache read failed");
            None
        })
    }

    fn cache_template(&self, template: &Template) {
        if !self.config.template_cache {
            return;
        }
        if let Err(e) = TemplateCacheRepo::set(self.store.as_ref(), template) {
            tracing::warn!(
                target: "ideals_session",
                template_id = %template.id,
                error = %e,
                "Failed to cache template",
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation decision
// ---------------------------------------------------------------------------

struct Reconciled {
    /// Set when a silent additive sync produced a new profile to persist.
    synced: Option<Profile>,
    changes: Option<ProfileTemplateDiff>,
    pending_sync: bool,
}

/// Decide what a load does with `profile` once `template` is known.
///
/// | Revisions                 | Result                                    |
/// |---------------------------|-------------------------------------------|
/// | equal                     | nothing                                   |
/// | profile never reconciled  | silent additive sync, no diff             |
/// | diff without removals     | silent additive sync, diff kept           |
/// | diff with removals        | pending confirmation, profile untouched   |
fn reconcile(profile: &Profile, template: &Template) -> Reconciled {
    if profile.template.revision == template.revision {
        return Reconciled {
            synced: None,
            changes: None,
            pending_sync: false,
        };
    }

    let changes = (!profile.is_unreconciled()).then(|| diff_profile_with_template(profile, template));
    if changes.as_ref().is_some_and(ProfileTemplateDiff::has_removals) {
        return Reconciled {
            synced: None,
            changes,
            pending_sync: true,
        };
    }

    Reconciled {
        synced: Some(sync_profile_with_template(profile, template, SyncPolicy::Additive)),
        changes,
        pending_sync: false,
    }
}
