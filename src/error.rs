//! Error types for backend generation calls.
//!
//! Stage, pipeline and configuration errors live next to the code that
//! raises them; this module only holds the failure taxonomy of a single
//! call against the generative backend.

use thiserror::Error;

/// Errors that can occur during a single LLM call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Response contained no choices")]
    EmptyResponse,
}

impl LlmError {
    /// Whether a failed attempt is worth repeating.
    ///
    /// Network failures, timeouts, rate limits, server-side errors and
    /// empty choice lists from an overloaded backend are transient.
    /// Authentication failures, malformed requests and envelopes that cannot
    /// be decoded will fail the same way on every attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(_)
            | LlmError::Timeout(_)
            | LlmError::RateLimited(_)
            | LlmError::EmptyResponse => true,
            LlmError::ApiError { code, .. } => *code >= 500 || *code == 429 || *code == 408,
            LlmError::MissingApiKey | LlmError::ParseError(_) => false,
        }
    }
}
