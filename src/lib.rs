/// Lorecraft - LLM-Powered TTRPG Content Generator
///
/// Core library for generating schema-conformant game content from an LLM
/// completion endpoint: schema acquisition and caching, concurrent
/// multi-attempt generation with retry, JSON recovery from noisy model
/// output, contract validation, and display-ready normalization.

pub mod config;
pub mod core;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
