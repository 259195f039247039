//! Error types for the generation pipeline.

use thiserror::Error;

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Failures within the generation pipeline.
///
/// All variants are locally recoverable via retry or fallback; only
/// `UnitExhausted` ever reaches a caller, and only from the single-record
/// detailed-expansion path. Batch generation reports failed units by
/// omission instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The LLM returned nothing usable: network failure, non-success status,
    /// or an empty completion. Never distinguished further.
    #[error("no response from LLM")]
    UpstreamUnavailable,

    /// Response text could not be coerced into a JSON value.
    #[error("response did not contain parseable JSON")]
    MalformedOutput,

    /// Parsed object failed validation against the schema contract.
    #[error("schema validation failed: {reason}")]
    SchemaViolation { reason: String },

    /// Every schema-generation round failed. Recovered internally by falling
    /// back to the default schema; never surfaced to callers.
    #[error("schema generation exhausted after {attempts} rounds")]
    SchemaAcquisitionFailed { attempts: u32 },

    /// A generation unit used its whole retry budget without success.
    #[error("generation failed after {attempts} attempts: {last_error}")]
    UnitExhausted { attempts: u32, last_error: String },
}
