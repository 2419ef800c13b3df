//! Profile/template sync engine.
//!
//! Produces a profile whose tracked item set matches a template, under one
//! of two policies. Both advance the profile's recorded template revision on
//! the returned value; callers must persist that value before adopting it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::{Profile, ProfileTemplateInfo, TrackedCollections};
use crate::template::Template;

/// How a sync treats entries whose item is no longer in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Only add missing entries; stale entries are kept untouched.
    Additive,
    /// Rebuild from the template, dropping stale entries. Loses data, so it
    /// needs explicit user confirmation.
    Cleanup,
}

impl SyncPolicy {
    pub fn from_cleanup(cleanup: bool) -> Self {
        if cleanup {
            Self::Cleanup
        } else {
            Self::Additive
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Cleanup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconcile `profile` with `template` and return the updated profile.
///
/// Existing values are never modified. New entries get the profile's
/// default value (`false`, or `0` in count mode).
pub fn sync_profile_with_template(
    profile: &Profile,
    template: &Template,
    policy: SyncPolicy,
) -> Profile {
    if template.revision < profile.template.revision {
        tracing::warn!(
            target: "ideals_core::sync",
            profile_id = %profile.id,
            template_revision = template.revision,
            recorded_revision = profile.template.revision,
            "Template revision is older than the profile's recorded revision",
        );
    }

    let default = profile.default_value();
    let collections: TrackedCollections = match policy {
        SyncPolicy::Additive => {
            let mut collections = profile.collections.clone();
            for tc in &template.collections {
                let tracked = collections.entry(tc.id.clone()).or_default();
                for item in &tc.items {
                    tracked.entry(item.id.clone()).or_insert(default);
                }
            }
            collections
        }
        SyncPolicy::Cleanup => template
            .collections
            .iter()
            .map(|tc| {
                let existing = profile.collections.get(&tc.id);
                let items: BTreeMap<_, _> = tc
                    .items
                    .iter()
                    .map(|item| {
                        let value = existing
                            .and_then(|values| values.get(&item.id))
                            .copied()
                            .unwrap_or(default);
                        (item.id.clone(), value)
                    })
                    .collect();
                (tc.id.clone(), items)
            })
            .collect(),
    };

    tracing::debug!(
        target: "ideals_core::sync",
        profile_id = %profile.id,
        template_id = %template.id,
        from_revision = profile.template.revision,
        to_revision = template.revision,
        %policy,
        value_mode = %profile.value_mode(),
        "Synced profile with template",
    );

    Profile {
        magic: profile.magic.clone(),
        version: profile.version,
        id: profile.id.clone(),
        name: profile.name.clone(),
        template: ProfileTemplateInfo {
            id: profile.template.id.clone(),
            link: profile.template.link.clone(),
            revision: template.revision,
        },
        flags: profile.flags.clone(),
        selected_members: profile.selected_members.clone(),
        collections,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
