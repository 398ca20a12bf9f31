//! Error types for the mock response stack.

use thiserror::Error;

/// Failures surfaced by matching, rendering, and resolution.
///
/// All variants are unrecoverable for the current test step: the stack is a
/// deterministic simulator, so any mismatch between expected and actual
/// requests is a defect to surface, never to paper over with a fallback.
#[derive(Debug, Error)]
pub enum MockError {
    /// No queued response and no matching rule for the request.
    #[error("no queued response or matching rule for {method} {path}")]
    UnhandledRequest { method: String, path: String },

    /// A render was requested for a template name the library does not know.
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    /// A template declared a required context key the caller did not supply.
    #[error("template '{template}' requires context key '{key}'")]
    MissingContextKey { template: String, key: String },

    /// An invalid regex was supplied to a matcher or template definition.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An invalid glob was supplied to a matcher.
    #[error("invalid glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A status code outside 100..=599 in a template or spec.
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    /// Handlebars rendering failed.
    #[error("template render failed: {0}")]
    Render(#[from] handlebars::RenderError),

    /// A fixture body could not be materialized (bad base64, unreadable file).
    #[error("invalid response body: {0}")]
    Body(String),
}

impl MockError {
    pub(crate) fn unhandled(method: &str, path: &str) -> Self {
        Self::UnhandledRequest {
            method: method.to_string(),
            path: path.to_string(),
        }
    }
}
