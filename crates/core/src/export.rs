//! Profile export file naming and serialisation.

use crate::error::CoreError;
use crate::profile::Profile;
use crate::types::APP_NAME;

/// File name for an exported profile: `my-ideals-profile-<name>.json`.
///
/// Path separators and control characters in the profile name are replaced
/// with `_` so the result is always a single path component.
pub fn export_file_name(profile: &Profile) -> String {
    let name: String = profile
        .name
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\') || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{APP_NAME}-profile-{name}.json")
}

/// Pretty-printed JSON document for an exported profile.
pub fn export_profile_json(profile: &Profile) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(profile)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::parse_profile_str;

    #[test]
    fn file_name_follows_convention() {
        let profile = Profile::new("Summer 24", "t", "https://x/t.json", vec![]);
        assert_eq!(export_file_name(&profile), "my-ideals-profile-Summer 24.json");
    }

    #[test]
    fn file_name_strips_path_separators() {
        let profile = Profile::new("../etc\\passwd", "t", "https://x/t.json", vec![]);
        assert_eq!(export_file_name(&profile), "my-ideals-profile-.._etc_passwd.json");
    }

    #[test]
    fn exported_json_reimports() {
        let mut profile = Profile::new("Mine", "t", "https://x/t.json", vec![]);
        profile.toggle_item("c", "i").unwrap();
        let json = export_profile_json(&profile).unwrap();
        assert!(json.contains('\n'));
        assert_eq!(parse_profile_str(&json).unwrap(), profile);
    }
}
