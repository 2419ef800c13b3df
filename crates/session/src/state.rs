//! Observable session state.

use serde::Serialize;

use ideals_core::diff::ProfileTemplateDiff;
use ideals_core::profile::Profile;
use ideals_core::template::Template;
use ideals_fetch::TemplateError;

/// Where the load state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Nothing loaded.
    Idle,
    /// A load is in flight. A cached template may already be exposed.
    Loading,
    /// Profile and template are loaded and reconciled.
    Ready,
    /// The template dropped tracked items; the user must pick a sync policy.
    NeedsConfirmation,
    /// The load failed; see [`SessionSnapshot::error`].
    Error,
}

/// Why a load failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The profile is missing or its stored record is invalid.
    #[error("profile: {message}")]
    Profile { profile_id: String, message: String },

    /// The template could not be fetched and no cached copy exists. The
    /// profile remains exposed.
    #[error("template: {0}")]
    Template(TemplateError),
}

/// Result of one [`ActiveProfile::load`](crate::ActiveProfile::load) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Loaded and reconciled. `synced` is set when a silent additive sync
    /// was applied and persisted.
    Ready { synced: bool },
    /// Loaded, but reconciliation waits on
    /// [`confirm_sync`](crate::ActiveProfile::confirm_sync).
    NeedsConfirmation,
    /// The load failed; the error is in the session state.
    Failed,
    /// A newer load or a `clear` took over; this load changed nothing
    /// after it was superseded.
    Superseded,
}

/// Mutable state behind [`ActiveProfile`](crate::ActiveProfile).
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub profile: Option<Profile>,
    pub template: Option<Template>,
    pub changes: Option<ProfileTemplateDiff>,
    pub pending_sync: bool,
    pub loading: bool,
    pub template_is_stale: bool,
    pub error: Option<LoadError>,
}

impl SessionState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn status(&self) -> LoadStatus {
        if self.loading {
            LoadStatus::Loading
        } else if self.error.is_some() {
            LoadStatus::Error
        } else if self.pending_sync {
            LoadStatus::NeedsConfirmation
        } else if self.profile.is_some() && self.template.is_some() {
            LoadStatus::Ready
        } else {
            LoadStatus::Idle
        }
    }
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: LoadStatus,
    pub profile: Option<Profile>,
    pub template: Option<Template>,
    /// Diff computed by the last load, kept until confirmed or dismissed.
    pub changes: Option<ProfileTemplateDiff>,
    /// Whether `changes` contains removals still awaiting a sync policy.
    pub pending_sync: bool,
    /// The template is a cached copy because the fetch failed.
    pub template_is_stale: bool,
    pub error: Option<LoadError>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            status: state.status(),
            profile: state.profile.clone(),
            template: state.template.clone(),
            changes: state.changes.clone(),
            pending_sync: state.pending_sync,
            template_is_stale: state.template_is_stale,
            error: state.error.clone(),
        }
    }
}
