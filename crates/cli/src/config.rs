use std::path::PathBuf;

/// Default location of the data file, relative to the working directory.
const DEFAULT_DATA_FILE: &str = "ideals-data.json";

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// JSON file holding profiles, cached templates and the profile index.
    pub data_file: PathBuf,
}

impl CliConfig {
    /// | Env Var            | Default            |
    /// |--------------------|--------------------|
    /// | `IDEALS_DATA_FILE` | `ideals-data.json` |
    pub fn from_env() -> Self {
        let data_file = std::env::var("IDEALS_DATA_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.into());
        Self {
            data_file: PathBuf::from(data_file),
        }
    }
}
