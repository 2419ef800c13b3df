use ideals_core::validation::ValidationError;

/// Why a template could not be obtained.
///
/// The `Display` output is the user-facing message for each variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The URL failed the syntax check; no request was sent.
    #[error("Invalid template URL: {url}")]
    InvalidUrl { url: String },

    /// Transport failure: DNS, connection, TLS, timeout.
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// The body is not JSON or does not satisfy the template schema.
    #[error("Invalid template:\n{0}")]
    Parse(ValidationError),

    #[error("Template ID mismatch: expected \"{expected_id}\", got \"{actual_id}\"")]
    IdMismatch {
        expected_id: String,
        actual_id: String,
    },
}

impl TemplateError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid-url",
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Parse(_) => "parse",
            Self::IdMismatch { .. } => "id-mismatch",
        }
    }
}

/// Outcome of a fetch that did not produce a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The caller cancelled the fetch; not a failure to report.
    #[error("Template fetch cancelled")]
    Cancelled,

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
