//! Template retrieval over HTTP.
//!
//! [`TemplateFetcher`] issues exactly one GET per call, validates the body
//! against the template schema and optionally checks the template id. Every
//! failure is classified as a [`TemplateError`]; cancellation through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) is reported
//! separately as [`FetchError::Cancelled`].

pub mod client;
pub mod config;
pub mod error;
pub mod source;

pub use client::TemplateFetcher;
pub use config::FetchConfig;
pub use error::{FetchError, TemplateError};
pub use source::TemplateSource;
