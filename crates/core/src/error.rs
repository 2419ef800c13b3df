use crate::flags::ValueMode;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed:\n{0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Operation requires {required} values but the profile stores {actual} values")]
    ValueMode {
        required: ValueMode,
        actual: ValueMode,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
