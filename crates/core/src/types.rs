/// Template revisions are non-negative and grow with every published change.
pub type Revision = u64;

/// Revision recorded by a profile that has never been reconciled.
pub const UNRECONCILED_REVISION: Revision = 0;

/// Application name shared by the file formats, export names and storage keys.
pub const APP_NAME: &str = "my-ideals";
