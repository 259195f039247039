//! Schema acquisition: LLM-generated schemas with caching and fallback.
//!
//! `get_schema` never fails. Resolution order: process-lifetime cache, then
//! LLM generation rounds (when enabled), then the configured default schema
//! file, then the hard-coded minimal schema. Cache entries never expire:
//! schemas are stable per (kind, context) for a session, and a new process
//! restarts the cache.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::generation::error::GenerationError;
use crate::core::generation::extract::extract_json;
use crate::core::generation::prompts;
use crate::core::generation::schema::Schema;
use crate::core::generation::types::GenerationConfig;
use crate::core::llm::CompletionClient;

/// Sampling band for schema generation. Narrower than the content band:
/// schema structure benefits from determinism, not variety.
const SCHEMA_TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=0.7;

/// Cache key: lowercased, trimmed (content kind, context).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SchemaKey {
    kind: String,
    context: String,
}

impl SchemaKey {
    fn new(kind: &str, context: &str) -> Self {
        Self {
            kind: kind.trim().to_lowercase(),
            context: context.trim().to_lowercase(),
        }
    }
}

/// Resolves and caches the schema for each (content kind, context) pair.
pub struct SchemaProvider {
    client: Arc<dyn CompletionClient>,
    config: GenerationConfig,
    cache: RwLock<HashMap<SchemaKey, Arc<Schema>>>,
}

impl SchemaProvider {
    pub fn new(client: Arc<dyn CompletionClient>, config: GenerationConfig) -> Self {
        Self {
            client,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the schema for a (content kind, context) pair.
    ///
    /// Always returns a usable schema; every failure path falls back to the
    /// default (and ultimately the minimal) schema.
    pub async fn get_schema(&self, content_kind: &str, context: &str) -> Arc<Schema> {
        if !self.config.schema_enabled {
            return Arc::new(self.default_schema());
        }

        let key = SchemaKey::new(content_kind, context);
        if let Some(schema) = self.cache.read().await.get(&key) {
            debug!(kind = %key.kind, "schema cache hit");
            return Arc::clone(schema);
        }

        let schema = match self.fetch_schema(content_kind, context).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Falling back to default schema: {e}");
                self.default_schema()
            }
        };

        let schema = Arc::new(schema);
        // Concurrent first-access races are benign: both writers hold a
        // complete schema, and last writer wins.
        self.cache.write().await.insert(key, Arc::clone(&schema));
        schema
    }

    /// Ask the LLM for a schema, up to `retry_count` rounds.
    async fn fetch_schema(&self, content_kind: &str, context: &str) -> Result<Schema, GenerationError> {
        let prompt = prompts::schema_prompt(
            &self.config.default_system,
            &self.config.default_setting,
            content_kind,
            context,
            &self.exemplar_schema_text(),
        );

        for round in 1..=self.config.retry_count {
            let temperature = rand::thread_rng().gen_range(SCHEMA_TEMPERATURE_RANGE);
            match self.client.complete(&prompt, temperature).await {
                Ok(response) => match extract_json(&response).map(Schema::new) {
                    Some(Ok(schema)) => {
                        info!(kind = content_kind, round, "schema generated");
                        return Ok(schema);
                    }
                    Some(Err(violation)) => {
                        warn!(
                            round,
                            budget = self.config.retry_count,
                            "generated schema rejected: {violation}"
                        );
                    }
                    None => {
                        warn!(
                            round,
                            budget = self.config.retry_count,
                            "schema response contained no parseable JSON"
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        round,
                        budget = self.config.retry_count,
                        "no response from LLM for schema generation: {e}"
                    );
                }
            }
            if round < self.config.retry_count {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(GenerationError::SchemaAcquisitionFailed {
            attempts: self.config.retry_count,
        })
    }

    /// The configured default schema, or the minimal fallback when the file
    /// is missing, unreadable, or fails shape validation.
    fn default_schema(&self) -> Schema {
        let Some(path) = &self.config.default_schema_path else {
            return Schema::minimal();
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Default schema file not found at {}: {e}. Using minimal fallback schema.",
                    path.display()
                );
                return Schema::minimal();
            }
        };

        match serde_json::from_str(&raw).map_err(|e| e.to_string()).and_then(|value| {
            Schema::new(value).map_err(|v| v.to_string())
        }) {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Default schema is invalid ({e}). Using minimal fallback schema.");
                Schema::minimal()
            }
        }
    }

    /// Exemplar schema text embedded into schema-request prompts: the
    /// default schema file's contents when available, else the minimal one.
    fn exemplar_schema_text(&self) -> String {
        if let Some(path) = &self.config.default_schema_path {
            if let Ok(text) = std::fs::read_to_string(path) {
                return text;
            }
        }
        Schema::minimal().to_json_string()
    }
}
