//! Generation orchestration: concurrent fan-out with per-unit retry loops.
//!
//! A batch request launches N independent generation units. Each unit owns a
//! bounded retry loop that feeds previous failure reasons back into the next
//! prompt so the model can self-correct. Unit failures are isolated: an
//! exhausted unit is simply omitted from the batch result. Results are
//! collected in issue order, not completion order, so output is
//! request-stable despite concurrent completion.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::core::generation::error::GenerationError;
use crate::core::generation::extract::extract_json;
use crate::core::generation::normalize::{normalize, NormalizedRecord};
use crate::core::generation::prompts;
use crate::core::generation::provider::SchemaProvider;
use crate::core::generation::schema::Schema;
use crate::core::generation::types::{GenerationConfig, GenerationRequest};
use crate::core::llm::CompletionClient;

/// Sampling band for content generation. Wider than the schema band:
/// content benefits from variety across the N units.
const CONTENT_TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.45..=0.85;

/// Fixed temperature for detail expansion of an existing summary.
const DETAIL_TEMPERATURE: f32 = 0.27;

/// Top-level coordinator for the structured-generation pipeline.
#[derive(Clone)]
pub struct ContentGenerator {
    client: Arc<dyn CompletionClient>,
    schemas: Arc<SchemaProvider>,
    config: GenerationConfig,
}

impl ContentGenerator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        schemas: Arc<SchemaProvider>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            client,
            schemas,
            config,
        }
    }

    /// Generate up to `request.count` records concurrently.
    ///
    /// Returns only the records whose units succeeded, in unit-issue order.
    /// Never errors: total failure is the empty vector.
    pub async fn generate(&self, request: &GenerationRequest) -> Vec<NormalizedRecord> {
        let schema = self
            .schemas
            .get_schema(&request.content_kind, &request.context)
            .await;
        let base_prompt = self.base_prompt(request, &schema);

        let mut handles = Vec::with_capacity(request.count);
        for unit in 0..request.count {
            let this = self.clone();
            let schema = Arc::clone(&schema);
            let prompt = base_prompt.clone();
            handles.push(tokio::spawn(async move {
                this.run_unit(&schema, &prompt, unit).await
            }));
        }

        // Joining in issue order keeps output order request-stable.
        let mut records = Vec::with_capacity(request.count);
        for handle in handles {
            match handle.await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => error!("generation unit panicked: {e}"),
            }
        }

        debug!(
            requested = request.count,
            produced = records.len(),
            kind = %request.content_kind,
            "batch generation finished"
        );
        records
    }

    /// Expand an already-generated summary into one fully detailed record.
    ///
    /// Unlike batch generation this is a direct, user-triggered action, so
    /// exhaustion surfaces as an explicit error instead of silence.
    pub async fn generate_detailed(
        &self,
        request: &GenerationRequest,
        base_summary: &str,
    ) -> Result<NormalizedRecord, GenerationError> {
        let schema = self
            .schemas
            .get_schema(&request.content_kind, &request.context)
            .await;

        let (system, setting) = self.narrative_defaults(request);
        let mut prompt = prompts::detail_prompt(
            &system,
            &setting,
            &request.content_kind,
            &request.context,
            base_summary,
        );
        prompt = self.append_request_context(prompt, request);

        let mut notes: Vec<String> = Vec::new();
        for attempt in 1..=self.config.retry_count {
            let attempt_prompt = prompts::with_error_notes(&prompt, &notes);
            match self
                .attempt(&schema, &attempt_prompt, DETAIL_TEMPERATURE)
                .await
            {
                Ok(record) => return Ok(record),
                Err(e) => {
                    warn!(
                        attempt,
                        budget = self.config.retry_count,
                        "detail generation attempt failed: {e}"
                    );
                    notes.push(attempt_note(&e));
                }
            }
            if attempt < self.config.retry_count {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(GenerationError::UnitExhausted {
            attempts: self.config.retry_count,
            last_error: notes.last().cloned().unwrap_or_default(),
        })
    }

    /// One unit's bounded retry loop. `None` on exhaustion.
    async fn run_unit(
        &self,
        schema: &Schema,
        base_prompt: &str,
        unit: usize,
    ) -> Option<NormalizedRecord> {
        let mut notes: Vec<String> = Vec::new();
        for attempt in 1..=self.config.retry_count {
            let prompt = prompts::with_error_notes(base_prompt, &notes);
            let temperature = rand::thread_rng().gen_range(CONTENT_TEMPERATURE_RANGE);

            match self.attempt(schema, &prompt, temperature).await {
                Ok(record) => {
                    debug!(unit, attempt, "generation unit succeeded");
                    return Some(record);
                }
                Err(e) => {
                    warn!(
                        unit,
                        attempt,
                        budget = self.config.retry_count,
                        "generation attempt failed: {e}"
                    );
                    notes.push(attempt_note(&e));
                }
            }
            if attempt < self.config.retry_count {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        warn!(
            unit,
            budget = self.config.retry_count,
            "generation unit exhausted its retry budget"
        );
        None
    }

    /// One complete attempt: call, extract, validate, normalize.
    async fn attempt(
        &self,
        schema: &Schema,
        prompt: &str,
        temperature: f32,
    ) -> Result<NormalizedRecord, GenerationError> {
        let response = self
            .client
            .complete(prompt, temperature)
            .await
            .map_err(|e| {
                debug!("LLM call failed: {e}");
                GenerationError::UpstreamUnavailable
            })?;

        let data = extract_json(&response).ok_or(GenerationError::MalformedOutput)?;
        schema.validate_instance(&data)?;
        Ok(normalize(&data, schema))
    }

    /// The shared base prompt for one batch.
    fn base_prompt(&self, request: &GenerationRequest, schema: &Schema) -> String {
        let (system, setting) = self.narrative_defaults(request);
        let prompt = prompts::content_prompt(
            &system,
            &setting,
            &request.content_kind,
            &request.context,
            &schema.to_json_string(),
        );
        self.append_request_context(prompt, request)
    }

    /// Blank system/setting fall back to the configured defaults.
    fn narrative_defaults(&self, request: &GenerationRequest) -> (String, String) {
        let system = match request.system.trim() {
            "" => self.config.default_system.clone(),
            s => s.to_string(),
        };
        let setting = match request.setting.trim() {
            "" => self.config.default_setting.clone(),
            s => s.to_string(),
        };
        (system, setting)
    }

    /// Append the optional breadcrumb line and campaign-notes block.
    fn append_request_context(&self, mut prompt: String, request: &GenerationRequest) -> String {
        if let Some(breadcrumb) = request.breadcrumb.as_deref().filter(|b| !b.trim().is_empty()) {
            prompt.push_str("\n\n");
            prompt.push_str(&prompts::breadcrumb_line(breadcrumb));
        }
        if let Some(notes) = request
            .campaign_notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
        {
            prompt.push_str("\n\n");
            prompt.push_str(notes.trim());
        }
        prompt
    }
}

/// The human-readable note fed back into the next attempt's prompt.
fn attempt_note(error: &GenerationError) -> String {
    match error {
        GenerationError::UpstreamUnavailable => "No response from LLM.".to_string(),
        GenerationError::MalformedOutput => "Failed to parse JSON.".to_string(),
        GenerationError::SchemaViolation { reason } => format!("Validation error: {reason}"),
        other => other.to_string(),
    }
}
