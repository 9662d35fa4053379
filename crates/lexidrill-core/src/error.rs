//! Error types.
//!
//! `DrillError` is what the core hands back to callers. `ProviderError`
//! describes generator and speech backend failures; it is defined here so the
//! practice orchestrator can downcast and classify failures without string
//! matching.

use thiserror::Error;

use crate::model::EntryId;

/// Errors surfaced by core operations.
#[derive(Debug, Error)]
pub enum DrillError {
    /// Sampling was asked to pick from an empty collection.
    #[error("no entries available")]
    EmptyInput,

    /// CSV header or row did not match the expected format.
    ///
    /// `line` is 1-based; 0 refers to the whole document.
    #[error("invalid CSV (line {line}): {message}")]
    Format { line: usize, message: String },

    /// A prompt template is malformed or was rendered with too few values.
    #[error("template error: {0}")]
    Template(String),

    /// The text generator failed or timed out.
    #[error("text generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// No entry with the given id exists.
    #[error("entry not found: {0}")]
    NotFound(EntryId),

    /// Entry fields failed validation.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(String),
}

impl DrillError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        DrillError::Format {
            line,
            message: message.into(),
        }
    }
}

/// Errors that can occur when talking to a generator or speech backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}
