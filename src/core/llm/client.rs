//! Completion client trait and error type.

use async_trait::async_trait;
use thiserror::Error;

/// Result type alias for completion calls.
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors from a single completion call.
///
/// The generation pipeline never distinguishes between these: every variant
/// is treated uniformly as "no response" and costs one attempt.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A 2xx response whose body did not contain completion text.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No API key available from config or environment.
    #[error("no API key configured")]
    MissingApiKey,
}

/// A stateless text-completion endpoint.
///
/// Implementations send exactly one prompt with one sampling temperature and
/// return the raw completion text. No retry logic belongs here.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier this client completes with.
    fn model(&self) -> &str;

    /// Send a single prompt and return the trimmed completion text.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}
