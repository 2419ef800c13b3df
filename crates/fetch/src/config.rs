use std::time::Duration;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client settings for template retrieval.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout (default: 30 s).
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("ideals/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `IDEALS_FETCH_TIMEOUT_SECS` | `30`    |
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("IDEALS_FETCH_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %raw,
                    default_secs = DEFAULT_TIMEOUT_SECS,
                    "Invalid IDEALS_FETCH_TIMEOUT_SECS, using default",
                ),
            }
        }
        config
    }
}
