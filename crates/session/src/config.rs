use std::time::Duration;

use ideals_storage::DEFAULT_DEBOUNCE;

/// Session behaviour settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between the last edit and the profile write (default: 500 ms).
    pub save_debounce: Duration,
    /// Show and fall back to the last fetched template while the network is
    /// slow or unavailable (default: `true`).
    pub template_cache: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_debounce: DEFAULT_DEBOUNCE,
            template_cache: true,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `IDEALS_SAVE_DEBOUNCE_MS` | `500`   |
    /// | `IDEALS_TEMPLATE_CACHE`   | `true`  |
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("IDEALS_SAVE_DEBOUNCE_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.save_debounce = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %raw, "Invalid IDEALS_SAVE_DEBOUNCE_MS, using default"),
            }
        }

        if let Ok(raw) = std::env::var("IDEALS_TEMPLATE_CACHE") {
            match parse_bool(&raw) {
                Some(enabled) => config.template_cache = enabled,
                None => tracing::warn!(value = %raw, "Invalid IDEALS_TEMPLATE_CACHE, using default"),
            }
        }

        config
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
