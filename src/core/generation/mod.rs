//! Structured content generation pipeline.
//!
//! Turns free-form LLM completions into validated, flat, display-ready
//! records. The pipeline stages, in order: schema acquisition with caching
//! ([`provider`]), prompt assembly ([`prompts`]), lenient JSON extraction
//! from raw completions ([`extract`]), draft-07 instance validation
//! ([`schema`]), and flattening into ordered string records ([`normalize`]).
//! [`orchestrator`] ties the stages together with concurrent fan-out and
//! feedback-driven retries.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod schema;
pub mod types;

pub use error::{GenerationError, Result};
pub use extract::extract_json;
pub use normalize::{normalize, NormalizedRecord};
pub use orchestrator::ContentGenerator;
pub use provider::SchemaProvider;
pub use schema::{Schema, ShapeViolation};
pub use types::{GenerationConfig, GenerationRequest};
