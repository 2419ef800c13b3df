//! HTTP client for template documents.

use tokio_util::sync::CancellationToken;

use ideals_core::template::{parse_template_str, Template};
use ideals_core::validation::is_valid_url;

use crate::config::FetchConfig;
use crate::error::{FetchError, TemplateError};
use crate::source::TemplateSource;

/// Fetches and validates templates over HTTP.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct TemplateFetcher {
    client: reqwest::Client,
}

impl TemplateFetcher {
    /// Build a fetcher with its own [`reqwest::Client`].
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// Create a fetcher reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch, validate and id-check the template at `url`.
    ///
    /// Sends at most one request and never retries. If `cancel` fires first
    /// the request is dropped and [`FetchError::Cancelled`] is returned.
    pub async fn fetch_template(
        &self,
        url: &str,
        expected_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Template, FetchError> {
        let url = url.trim();
        if !is_valid_url(url) {
            return Err(TemplateError::InvalidUrl {
                url: url.to_string(),
            }
            .into());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url, "Template fetch cancelled");
                Err(FetchError::Cancelled)
            }
            result = self.request(url, expected_id) => result.map_err(FetchError::from),
        }
    }

    async fn request(&self, url: &str, expected_id: Option<&str>) -> Result<Template, TemplateError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "Template request failed");
            TemplateError::Network(e.to_string())
        })?;

        let response = Self::ensure_success(response)?;

        let body = response
            .text()
            .await
            .map_err(|e| TemplateError::Network(e.to_string()))?;

        let template = parse_template_str(&body).map_err(|e| {
            tracing::warn!(url, issues = e.issues.len(), "Fetched template failed validation");
            TemplateError::Parse(e)
        })?;

        if let Some(expected_id) = expected_id {
            if template.id != expected_id {
                return Err(TemplateError::IdMismatch {
                    expected_id: expected_id.to_string(),
                    actual_id: template.id,
                });
            }
        }

        tracing::info!(
            template_id = %template.id,
            template_name = %template.name,
            revision = template.revision,
            "Fetched template",
        );
        Ok(template)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TemplateError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TemplateError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(response)
    }
}

impl TemplateSource for TemplateFetcher {
    async fn fetch_template(
        &self,
        url: &str,
        expected_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Template, FetchError> {
        TemplateFetcher::fetch_template(self, url, expected_id, cancel).await
    }
}
