//! Locally generated profile identifiers.
//!
//! Ids are 21 characters drawn from the URL-safe alphabet `[A-Za-z0-9_-]`,
//! compatible with profiles exported by earlier versions of the app.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Length of a generated profile id.
pub const PROFILE_ID_LEN: usize = 21;

const ID_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

static PROFILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{21}$").expect("valid regex"));

/// Generate a fresh random profile id.
pub fn generate_profile_id() -> String {
    let mut rng = rand::rng();
    (0..PROFILE_ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Whether `id` has the shape of a profile id.
pub fn is_valid_profile_id(id: &str) -> bool {
    PROFILE_ID_RE.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        for _ in 0..100 {
            let id = generate_profile_id();
            assert_eq!(id.len(), PROFILE_ID_LEN);
            assert!(is_valid_profile_id(&id), "{id} should be valid");
        }
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_profile_id(), generate_profile_id());
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(is_valid_profile_id("V1StGXR8_Z5jdHi6B-myT"));
        assert!(!is_valid_profile_id("short"));
        assert!(!is_valid_profile_id("V1StGXR8_Z5jdHi6B-myT!"));
        assert!(!is_valid_profile_id("V1StGXR8 Z5jdHi6B-myT"));
        assert!(!is_valid_profile_id(""));
    }
}
