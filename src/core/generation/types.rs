//! Request and configuration types for the generation pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Runtime knobs for the pipeline, derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Attempts per generation unit and per schema-generation round.
    pub retry_count: u32,
    /// Fixed delay between retry attempts.
    pub retry_delay: Duration,
    /// When false, schema generation is skipped in favor of the default.
    pub schema_enabled: bool,
    /// Optional pre-authored default schema file.
    pub default_schema_path: Option<PathBuf>,
    /// Game system substituted when a request leaves it blank.
    pub default_system: String,
    /// Setting substituted when a request leaves it blank.
    pub default_setting: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay: Duration::from_secs(2),
            schema_enabled: false,
            default_schema_path: None,
            default_system: "D&D 3.5e".to_string(),
            default_setting: "a generic fantasy setting".to_string(),
        }
    }
}

impl From<&AppConfig> for GenerationConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            retry_count: config.generation.retry_count,
            retry_delay: Duration::from_secs(config.generation.retry_delay_secs),
            schema_enabled: config.schema.enabled,
            default_schema_path: config.schema.default_schema.clone(),
            default_system: config.generation.default_system.clone(),
            default_setting: config.generation.default_setting.clone(),
        }
    }
}

/// One batch-generation request. Immutable per orchestrator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// What to generate (weapon, npc, tavern, ...).
    pub content_kind: String,
    /// Free-text context themes, including any level-range suffix the
    /// caller appended.
    pub context: String,
    /// Number of independent generation units to run.
    pub count: usize,
    /// Game system; blank means "use the configured default".
    pub system: String,
    /// Setting; blank means "use the configured default".
    pub setting: String,
    /// Selected category/type hierarchy line, if any.
    pub breadcrumb: Option<String>,
    /// Caller-supplied campaign notes appended to the prompt, if any.
    pub campaign_notes: Option<String>,
}

impl GenerationRequest {
    pub fn new(content_kind: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            content_kind: content_kind.into(),
            context: context.into(),
            count: 3,
            system: String::new(),
            setting: String::new(),
            breadcrumb: None,
            campaign_notes: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = setting.into();
        self
    }

    pub fn with_breadcrumb(mut self, breadcrumb: impl Into<String>) -> Self {
        self.breadcrumb = Some(breadcrumb.into());
        self
    }

    pub fn with_campaign_notes(mut self, notes: impl Into<String>) -> Self {
        self.campaign_notes = Some(notes.into());
        self
    }
}
