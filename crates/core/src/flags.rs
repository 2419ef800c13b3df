//! Profile feature flags and the value mode they select.

use serde::{Deserialize, Serialize};

/// Optional per-profile feature toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileFlag {
    /// Track a non-negative count per item instead of a done/not-done flag.
    #[serde(rename = "enable-count")]
    EnableCount,
}

/// Every flag the profile format knows about.
pub const ALL_FLAGS: &[ProfileFlag] = &[ProfileFlag::EnableCount];

impl ProfileFlag {
    /// Wire name used in profile documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnableCount => "enable-count",
        }
    }

    /// Parse a wire name; `None` for unknown flags.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_FLAGS.iter().copied().find(|flag| flag.as_str() == name)
    }
}

impl std::fmt::Display for ProfileFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value type stored for every tracked item of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Values are booleans (`done` / `not done`).
    Boolean,
    /// Values are non-negative counts.
    Count,
}

impl ValueMode {
    pub fn from_flags(flags: &[ProfileFlag]) -> Self {
        if flags.contains(&ProfileFlag::EnableCount) {
            Self::Count
        } else {
            Self::Boolean
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Count => "count",
        }
    }
}

impl std::fmt::Display for ValueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
