use ideals_core::error::CoreError;
use ideals_storage::StorageError;

/// Failures of session and library operations.
///
/// Load failures are not reported here; they are part of the session state
/// (see [`LoadError`](crate::LoadError)).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A mutation was attempted with no profile loaded.
    #[error("No profile is loaded")]
    NoProfile,

    #[error("Invalid template URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ideals_core::validation::ValidationError> for SessionError {
    fn from(err: ideals_core::validation::ValidationError) -> Self {
        Self::Core(CoreError::Validation(err))
    }
}
