//! End-to-end pipeline tests with a scripted completion client.
//!
//! No network and no live model: a rule-driven stub decides per prompt
//! whether to fail, return garbage, or return a valid record, which makes
//! the retry and feedback behavior deterministic regardless of how the
//! concurrent units interleave.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lorecraft::core::generation::{
    ContentGenerator, GenerationConfig, GenerationError, GenerationRequest, SchemaProvider,
};
use lorecraft::core::llm::{CompletionClient, LLMError};

/// Stub client that answers each prompt through a caller-supplied rule and
/// records every prompt it receives.
struct RuleClient {
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    rule: Box<dyn Fn(&str) -> Result<String, LLMError> + Send + Sync>,
}

impl RuleClient {
    fn new(rule: impl Fn(&str) -> Result<String, LLMError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            rule: Box::new(rule),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for RuleClient {
    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.rule)(prompt)
    }
}

fn test_config() -> GenerationConfig {
    GenerationConfig {
        retry_count: 3,
        retry_delay: Duration::ZERO,
        schema_enabled: false,
        default_schema_path: None,
        default_system: "D&D 3.5e".to_string(),
        default_setting: "a generic fantasy setting".to_string(),
    }
}

fn generator(client: Arc<RuleClient>) -> ContentGenerator {
    let config = test_config();
    let schemas = Arc::new(SchemaProvider::new(client.clone(), config.clone()));
    ContentGenerator::new(client, schemas, config)
}

const VALID_RECORD: &str =
    r#"{"name": "Flamebrand", "description": "A longsword wreathed in fire."}"#;

#[tokio::test]
async fn test_batch_success_first_try() {
    let client = RuleClient::new(|_| Ok(VALID_RECORD.to_string()));
    let gen = generator(client.clone());

    let request = GenerationRequest::new("Magic Item", "any shop").with_count(3);
    let records = gen.generate(&request).await;

    assert_eq!(records.len(), 3);
    assert_eq!(client.call_count(), 3);
    for record in &records {
        assert_eq!(record.get("Name"), Some("Flamebrand"));
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["Name", "Description"]);
    }
}

#[tokio::test]
async fn test_total_failure_yields_empty_batch_after_full_budget() {
    let client = RuleClient::new(|_| {
        Err(LLMError::Api {
            status: 500,
            message: "internal".to_string(),
        })
    });
    let gen = generator(client.clone());

    let request = GenerationRequest::new("NPC", "tavern patrons").with_count(4);
    let records = gen.generate(&request).await;

    assert!(records.is_empty());
    // 4 units, 3 attempts each. Schema generation is disabled so no extra calls.
    assert_eq!(client.call_count(), 12);
}

#[tokio::test]
async fn test_units_recover_after_feedback() {
    // Garbage until the prompt carries two accumulated failure notes, then a
    // valid record. Each unit fails twice and succeeds on its third attempt.
    let client = RuleClient::new(|prompt: &str| {
        if prompt.matches("Failed to parse JSON.").count() < 2 {
            Ok("not json at all".to_string())
        } else {
            Ok(VALID_RECORD.to_string())
        }
    });
    let gen = generator(client.clone());

    let request = GenerationRequest::new("Magic Item", "blacksmith").with_count(3);
    let records = gen.generate(&request).await;

    assert_eq!(records.len(), 3);
    assert_eq!(client.call_count(), 9);

    // Retry prompts must carry the feedback block with prior failure notes.
    let prompts = client.recorded_prompts();
    let with_notes: Vec<&String> = prompts
        .iter()
        .filter(|p| p.contains("# Errors so far:"))
        .collect();
    assert_eq!(with_notes.len(), 6);
    assert!(with_notes.iter().all(|p| p.contains("Failed to parse JSON.")));
}

#[tokio::test]
async fn test_schema_violations_fed_back_as_validation_notes() {
    // A record with an unexpected extra property violates the minimal
    // schema's closed property set.
    let client = RuleClient::new(|prompt: &str| {
        if prompt.contains("Validation error:") {
            Ok(VALID_RECORD.to_string())
        } else {
            Ok(r#"{"name": "X", "description": "Y", "sneaky": 1}"#.to_string())
        }
    });
    let gen = generator(client.clone());

    let request = GenerationRequest::new("Spell", "low level").with_count(1);
    let records = gen.generate(&request).await;

    assert_eq!(records.len(), 1);
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_blank_system_and_setting_fall_back_to_defaults() {
    let client = RuleClient::new(|_| Ok(VALID_RECORD.to_string()));
    let gen = generator(client.clone());

    let request = GenerationRequest::new("Magic Item", "any").with_count(1);
    gen.generate(&request).await;

    let prompts = client.recorded_prompts();
    assert!(prompts[0].contains("D&D 3.5e"));
    assert!(prompts[0].contains("a generic fantasy setting"));
}

#[tokio::test]
async fn test_breadcrumb_and_campaign_notes_reach_the_prompt() {
    let client = RuleClient::new(|_| Ok(VALID_RECORD.to_string()));
    let gen = generator(client.clone());

    let request = GenerationRequest::new("NPC", "city guard")
        .with_count(1)
        .with_system("Pathfinder 2e")
        .with_breadcrumb("People > Guards")
        .with_campaign_notes("The guard captain is secretly a doppelganger.");
    gen.generate(&request).await;

    let prompts = client.recorded_prompts();
    assert!(prompts[0].contains("Pathfinder 2e"));
    assert!(prompts[0].contains("Selected category/type hierarchy: People > Guards"));
    assert!(prompts[0].contains("secretly a doppelganger"));
}

#[tokio::test]
async fn test_detail_generation_success() {
    let client = RuleClient::new(|prompt: &str| {
        assert!(prompt.contains("a plain iron ring"));
        Ok(VALID_RECORD.to_string())
    });
    let gen = generator(client.clone());

    let request = GenerationRequest::new("Magic Item", "cursed items");
    let record = gen
        .generate_detailed(&request, "a plain iron ring")
        .await
        .expect("detail generation should succeed");

    assert_eq!(record.get("Name"), Some("Flamebrand"));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_detail_generation_exhaustion_is_an_error() {
    let client = RuleClient::new(|_| Ok("still not json".to_string()));
    let gen = generator(client.clone());

    let request = GenerationRequest::new("Magic Item", "cursed items");
    let err = gen
        .generate_detailed(&request, "a plain iron ring")
        .await
        .expect_err("exhaustion should surface as an error");

    match err {
        GenerationError::UnitExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "Failed to parse JSON.");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn test_one_bad_attempt_does_not_sink_the_batch() {
    // The first call anywhere in the batch returns garbage; every later call
    // succeeds. The affected unit recovers on retry.
    let counter = AtomicUsize::new(0);
    let client = RuleClient::new(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok("garbage".to_string())
        } else {
            Ok(VALID_RECORD.to_string())
        }
    });
    let gen = generator(client.clone());

    let request = GenerationRequest::new("NPC", "merchants").with_count(2);
    let records = gen.generate(&request).await;

    // One attempt was wasted on garbage, the retry recovered it.
    assert_eq!(records.len(), 2);
    assert_eq!(client.call_count(), 3);
}
