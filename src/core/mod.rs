pub mod generation;
pub mod llm;
pub mod logging;
