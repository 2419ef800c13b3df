//! Storage key layout.
//!
//! | Record         | Key                              |
//! |----------------|----------------------------------|
//! | profile        | `my-ideals:profile:<profile id>` |
//! | template cache | `my-ideals:template:<template id>` |
//! | profile index  | `my-ideals:profile-index`        |

use ideals_core::id::is_valid_profile_id;
use ideals_core::types::APP_NAME;

const PROFILE_SEGMENT: &str = "profile:";
const TEMPLATE_SEGMENT: &str = "template:";

pub fn profile_index_key() -> String {
    format!("{APP_NAME}:profile-index")
}

pub fn profile_key_prefix() -> String {
    format!("{APP_NAME}:{PROFILE_SEGMENT}")
}

pub fn profile_key(profile_id: &str) -> String {
    format!("{}{profile_id}", profile_key_prefix())
}

pub fn template_key(template_id: &str) -> String {
    format!("{APP_NAME}:{TEMPLATE_SEGMENT}{template_id}")
}

/// Extract the profile id from a profile key. Keys whose suffix is not a
/// valid profile id are not profile records.
pub fn profile_id_from_key(key: &str) -> Option<&str> {
    let prefix = profile_key_prefix();
    key.strip_prefix(prefix.as_str())
        .filter(|id| is_valid_profile_id(id))
}
