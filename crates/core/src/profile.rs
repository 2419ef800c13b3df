//! Profile schema, validator and in-place mutations.
//!
//! A profile is the user's personal tracking state bound to one template.
//! Profiles come from local storage or imported files, so [`parse_profile`]
//! re-validates them fully: a structural pass first, then a refinement pass
//! checking that every tracked value matches the profile's value mode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::flags::{ProfileFlag, ValueMode};
use crate::id::{generate_profile_id, is_valid_profile_id};
use crate::types::{Revision, UNRECONCILED_REVISION};
use crate::validation::{join_path, type_name, Issues, ValidationError};

/// Discriminator every profile document must carry.
pub const PROFILE_MAGIC: &str = "my-ideals-profile";

/// The only profile format version understood by this crate.
pub const PROFILE_VERSION: u32 = 1;

/// `collection id -> item id -> value`.
pub type TrackedCollections = BTreeMap<String, BTreeMap<String, CompletionValue>>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub magic: String,
    pub version: u32,
    pub id: String,
    pub name: String,
    pub template: ProfileTemplateInfo,
    #[serde(default)]
    pub flags: Vec<ProfileFlag>,
    #[serde(default)]
    pub selected_members: Vec<String>,
    pub collections: TrackedCollections,
}

/// Which template a profile is bound to, and the last template revision the
/// profile was reconciled against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTemplateInfo {
    pub id: String,
    pub link: String,
    pub revision: Revision,
}

/// Recorded progress for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionValue {
    Done(bool),
    Count(u64),
}

impl CompletionValue {
    /// The "not done" value for a value mode.
    pub fn default_for(mode: ValueMode) -> Self {
        match mode {
            ValueMode::Boolean => Self::Done(false),
            ValueMode::Count => Self::Count(0),
        }
    }

    pub fn mode(self) -> ValueMode {
        match self {
            Self::Done(_) => ValueMode::Boolean,
            Self::Count(_) => ValueMode::Count,
        }
    }

    /// Whether any progress has been recorded.
    pub fn is_done(self) -> bool {
        match self {
            Self::Done(done) => done,
            Self::Count(count) => count > 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction and mutation
// ---------------------------------------------------------------------------

impl Profile {
    /// Create an empty profile bound to a template.
    ///
    /// The recorded revision is reset to [`UNRECONCILED_REVISION`] so the
    /// first load reconciles the profile silently.
    pub fn new(
        name: impl Into<String>,
        template_id: impl Into<String>,
        template_link: impl Into<String>,
        flags: Vec<ProfileFlag>,
    ) -> Self {
        Self {
            magic: PROFILE_MAGIC.to_string(),
            version: PROFILE_VERSION,
            id: generate_profile_id(),
            name: name.into(),
            template: ProfileTemplateInfo {
                id: template_id.into(),
                link: template_link.into(),
                revision: UNRECONCILED_REVISION,
            },
            flags,
            selected_members: Vec::new(),
            collections: TrackedCollections::new(),
        }
    }

    pub fn has_flag(&self, flag: ProfileFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn value_mode(&self) -> ValueMode {
        ValueMode::from_flags(&self.flags)
    }

    /// Value given to newly tracked items.
    pub fn default_value(&self) -> CompletionValue {
        CompletionValue::default_for(self.value_mode())
    }

    /// Whether the profile has never been reconciled against its template.
    pub fn is_unreconciled(&self) -> bool {
        self.template.revision == UNRECONCILED_REVISION
    }

    pub fn value(&self, collection_id: &str, item_id: &str) -> Option<CompletionValue> {
        self.collections.get(collection_id)?.get(item_id).copied()
    }

    /// Every tracked `(collection id, item id)` pair, ordered by collection
    /// id then item id.
    pub fn tracked_keys(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.collections.iter().flat_map(|(collection_id, items)| {
            items
                .keys()
                .map(move |item_id| (collection_id.as_str(), item_id.as_str()))
        })
    }

    pub fn tracked_count(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    /// Flip a boolean item, tracking it if needed. Returns the new state.
    pub fn toggle_item(&mut self, collection_id: &str, item_id: &str) -> Result<bool, CoreError> {
        self.require_mode(ValueMode::Boolean)?;
        let slot = self
            .collections
            .entry(collection_id.to_string())
            .or_default()
            .entry(item_id.to_string())
            .or_insert(CompletionValue::Done(false));
        let next = !slot.is_done();
        *slot = CompletionValue::Done(next);
        Ok(next)
    }

    /// Record a count for an item, tracking it if needed.
    pub fn set_count(
        &mut self,
        collection_id: &str,
        item_id: &str,
        count: u64,
    ) -> Result<(), CoreError> {
        self.require_mode(ValueMode::Count)?;
        self.collections
            .entry(collection_id.to_string())
            .or_default()
            .insert(item_id.to_string(), CompletionValue::Count(count));
        Ok(())
    }

    /// Add or remove a member from the active filter. Returns whether the
    /// member is selected afterwards.
    pub fn toggle_member(&mut self, member_id: &str) -> bool {
        if let Some(pos) = self.selected_members.iter().position(|m| m == member_id) {
            self.selected_members.remove(pos);
            false
        } else {
            self.selected_members.push(member_id.to_string());
            true
        }
    }

    fn require_mode(&self, required: ValueMode) -> Result<(), CoreError> {
        let actual = self.value_mode();
        if actual == required {
            Ok(())
        } else {
            Err(CoreError::ValueMode { required, actual })
        }
    }
}

// ---------------------------------------------------------------------------
// Default filling
// ---------------------------------------------------------------------------

/// Fill fields that older profile documents may lack.
///
/// | Field             | Default |
/// |-------------------|---------|
/// | `selectedMembers` | `[]`    |
/// | `flags`           | `[]`    |
///
/// Returns the names of the fields that were filled, in table order.
pub fn fill_profile_defaults(obj: &mut Map<String, Value>) -> Vec<&'static str> {
    let mut filled = Vec::new();
    for field in ["selectedMembers", "flags"] {
        if !obj.contains_key(field) {
            obj.insert(field.to_string(), Value::Array(Vec::new()));
            filled.push(field);
        }
    }
    filled
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Validate untrusted JSON and convert it into a [`Profile`].
pub fn parse_profile(raw: &Value) -> Result<Profile, ValidationError> {
    let mut value = raw.clone();
    if let Value::Object(obj) = &mut value {
        let filled = fill_profile_defaults(obj);
        if !filled.is_empty() {
            tracing::debug!(fields = ?filled, "Filled missing profile fields with defaults");
        }
    }
    validate_profile(&value)?;
    serde_json::from_value(value).map_err(|e| ValidationError::single("", e.to_string()))
}

/// Parse a profile from a JSON string. Malformed JSON yields a single issue
/// at the document root.
pub fn parse_profile_str(raw: &str) -> Result<Profile, ValidationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ValidationError::single("", format!("Invalid JSON: {e}")))?;
    parse_profile(&value)
}

/// Structural pass followed by the value-mode refinement pass.
///
/// Expects defaults to have been filled already; a missing `flags` or
/// `selectedMembers` field is reported as an issue here.
pub fn validate_profile(raw: &Value) -> Result<(), ValidationError> {
    let mut issues = Issues::new();
    let Some(root) = issues.object(raw, "") else {
        return issues.into_result();
    };

    issues.literal_str(root, "magic", PROFILE_MAGIC, "");
    issues.literal_u64(root, "version", u64::from(PROFILE_VERSION), "");
    if let Some(id) = issues.string(root, "id", "") {
        if !is_valid_profile_id(id) {
            issues.push("id", "Invalid profile id");
        }
    }
    issues.string(root, "name", "");

    if let Some(template) = issues.object_field(root, "template", "") {
        issues.string(template, "id", "template");
        issues.string(template, "link", "template");
        issues.non_negative_int(template, "revision", "template");
    }

    let mode = validate_flags(&mut issues, root);

    if let Some(members) = issues.array(root, "selectedMembers", "") {
        for (i, member) in members.iter().enumerate() {
            issues.as_string(member, &join_path("selectedMembers", i));
        }
    }

    let collections = issues.object_field(root, "collections", "");
    if let Some(collections) = collections {
        validate_collection_shape(&mut issues, collections);
    }

    // The expected value type depends on `flags`, so this only runs once the
    // structure is known to be sound.
    if let (Some(mode), Some(collections)) = (mode, collections) {
        if issues.is_empty() {
            refine_value_types(&mut issues, collections, mode);
        }
    }

    issues.into_result()
}

/// Returns the value mode when `flags` is well-formed.
fn validate_flags(issues: &mut Issues, root: &Map<String, Value>) -> Option<ValueMode> {
    let flags = issues.array(root, "flags", "")?;
    let mut known = Vec::with_capacity(flags.len());
    let mut ok = true;
    for (i, flag) in flags.iter().enumerate() {
        let path = join_path("flags", i);
        match issues.as_string(flag, &path) {
            Some(name) => match ProfileFlag::from_name(name) {
                Some(flag) => known.push(flag),
                None => {
                    issues.push(path, format!("Unknown profile flag '{name}'"));
                    ok = false;
                }
            },
            None => ok = false,
        }
    }
    ok.then(|| ValueMode::from_flags(&known))
}

fn validate_collection_shape(issues: &mut Issues, collections: &Map<String, Value>) {
    for (collection_id, items) in collections {
        let path = join_path("collections", collection_id);
        let Some(items) = issues.object(items, &path) else {
            continue;
        };
        for (item_id, value) in items {
            let is_valid = value.is_boolean() || value.as_u64().is_some();
            if !is_valid {
                issues.push(
                    join_path(&path, item_id),
                    format!(
                        "Expected boolean or non-negative integer, received {}",
                        type_name(value)
                    ),
                );
            }
        }
    }
}

fn refine_value_types(issues: &mut Issues, collections: &Map<String, Value>, mode: ValueMode) {
    for (collection_id, items) in collections {
        let Some(items) = items.as_object() else {
            continue;
        };
        for (item_id, value) in items {
            let matches = match mode {
                ValueMode::Boolean => value.is_boolean(),
                ValueMode::Count => value.as_u64().is_some(),
            };
            if !matches {
                let message = match mode {
                    ValueMode::Boolean => "Expected boolean (count mode disabled)",
                    ValueMode::Count => "Expected non-negative integer (count mode enabled)",
                };
                issues.push(
                    join_path(&join_path("collections", collection_id), item_id),
                    message,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
