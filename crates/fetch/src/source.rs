use tokio_util::sync::CancellationToken;

use ideals_core::template::Template;

use crate::error::FetchError;

/// Anything that can produce a validated template for a URL.
///
/// Implemented by [`TemplateFetcher`](crate::TemplateFetcher) for HTTP and
/// by in-memory doubles in tests.
pub trait TemplateSource: Send + Sync {
    /// Retrieve the template at `url`.
    ///
    /// When `expected_id` is given, a template with a different id is
    /// rejected with [`TemplateError::IdMismatch`](crate::TemplateError::IdMismatch).
    /// Must resolve to [`FetchError::Cancelled`] promptly once `cancel` fires.
    fn fetch_template(
        &self,
        url: &str,
        expected_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<Template, FetchError>> + Send;
}

impl<T: TemplateSource> TemplateSource for std::sync::Arc<T> {
    fn fetch_template(
        &self,
        url: &str,
        expected_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<Template, FetchError>> + Send {
        (**self).fetch_template(url, expected_id, cancel)
    }
}
