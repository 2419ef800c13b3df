//! Repository for the last successfully fetched template of each template id.
//!
//! The cache lets a profile be shown while its template is being fetched,
//! and stand in for the template when the network is unavailable.

use ideals_core::template::{parse_template_str, Template};

use crate::error::StorageError;
use crate::keys;
use crate::kv::KeyValueStore;

pub struct TemplateCacheRepo;

impl TemplateCacheRepo {
    /// Cached template for `template_id`; corrupt or mismatched entries read
    /// as `None`.
    pub fn get(store: &dyn KeyValueStore, template_id: &str) -> Result<Option<Template>, StorageError> {
        let Some(raw) = store.get(&keys::template_key(template_id))? else {
            return Ok(None);
        };
        match parse_template_str(&raw) {
            Ok(template) if template.id == template_id => Ok(Some(template)),
            Ok(template) => {
                tracing::warn!(
                    template_id,
                    cached_id = %template.id,
                    "Cached template id does not match its key",
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(template_id, error = %e, "Discarding invalid cached template");
                Ok(None)
            }
        }
    }

    pub fn set(store: &dyn KeyValueStore, template: &Template) -> Result<(), StorageError> {
        let raw = serde_json::to_string(template)?;
        store.set(&keys::template_key(&template.id), &raw)
    }

    pub fn delete(store: &dyn KeyValueStore, template_id: &str) -> Result<(), StorageError> {
        store.remove(&keys::template_key(template_id))
    }
}
