//! Profile/template diff engine.
//!
//! Compares the `(collection id, item id)` pairs a profile tracks with the
//! pairs a template currently defines. Item identity across template
//! revisions is exactly that pair, so renamed items and collections are not
//! reported as changes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::profile::Profile;
use crate::template::Template;

/// One added or removed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    pub id: String,
    /// Display name; only known for items still in the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Added or removed items of a single collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionChange {
    pub id: String,
    /// Current template name; `None` when the collection itself is gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub items: Vec<ItemChange>,
}

/// Delta between a profile's tracked item set and a template's item set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTemplateDiff {
    /// In the template but not yet tracked, in template order.
    pub added: Vec<CollectionChange>,
    /// Tracked but no longer in the template, ordered by collection id.
    pub removed: Vec<CollectionChange>,
}

impl ProfileTemplateDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Whether applying a cleanup sync would discard tracked entries.
    pub fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn added_item_count(&self) -> usize {
        self.added.iter().map(|c| c.items.len()).sum()
    }

    pub fn removed_item_count(&self) -> usize {
        self.removed.iter().map(|c| c.items.len()).sum()
    }
}

/// Compute which items a template adds to, and removes from, the set a
/// profile tracks.
pub fn diff_profile_with_template(profile: &Profile, template: &Template) -> ProfileTemplateDiff {
    let tracked: HashSet<(&str, &str)> = profile.tracked_keys().collect();
    let current: HashSet<(&str, &str)> = template.item_keys().collect();

    let added: Vec<CollectionChange> = template
        .collections
        .iter()
        .filter_map(|collection| {
            let items: Vec<ItemChange> = collection
                .items
                .iter()
                .filter(|item| !tracked.contains(&(collection.id.as_str(), item.id.as_str())))
                .map(|item| ItemChange {
                    id: item.id.clone(),
                    name: Some(item.name.clone()),
                })
                .collect();
            (!items.is_empty()).then(|| CollectionChange {
                id: collection.id.clone(),
                name: Some(collection.name.clone()),
                items,
            })
        })
        .collect();

    let removed: Vec<CollectionChange> = profile
        .collections
        .iter()
        .filter_map(|(collection_id, items)| {
            let stale: Vec<ItemChange> = items
                .keys()
                .filter(|item_id| !current.contains(&(collection_id.as_str(), item_id.as_str())))
                .map(|item_id| ItemChange {
                    id: item_id.clone(),
                    name: None,
                })
                .collect();
            (!stale.is_empty()).then(|| CollectionChange {
                id: collection_id.clone(),
                name: template.collection(collection_id).map(|c| c.name.clone()),
                items: stale,
            })
        })
        .collect();

    tracing::debug!(
        target: "ideals_core::sync",
        template_id = %template.id,
        from_revision = profile.template.revision,
        to_revision = template.revision,
        added_collections = added.len(),
        removed_collections = removed.len(),
        "Diffed profile against template",
    );

    ProfileTemplateDiff { added, removed }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
