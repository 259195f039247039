//! LLM Completion Client
//!
//! A deliberately thin client layer: one prompt and one temperature in,
//! raw text or a failure out. No retries live here; the generation
//! pipeline owns all retry and recovery policy.
//!
//! - `client`: the `CompletionClient` trait and error type
//! - `openai`: OpenAI-compatible chat-completions implementation

pub mod client;
pub mod openai;

pub use client::{CompletionClient, LLMError, Result};
pub use openai::OpenAICompatibleClient;
