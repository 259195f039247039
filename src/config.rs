use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub generation: GenerationSettings,
    pub schema: SchemaSettings,
}

/// Completion endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key for the completion endpoint. `OPENAI_API_KEY` takes precedence.
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Output-token cap per completion.
    pub max_tokens: u32,
    /// Hard timeout for a single completion request, in seconds.
    pub request_timeout_secs: u64,
    /// Text prepended to every prompt (persona/priming). Empty disables it.
    pub primer: String,
}

/// Retry behavior and narrative defaults for content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Attempts per generation unit (and per schema-generation round).
    pub retry_count: u32,
    /// Fixed delay between retry attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Game system used when the caller leaves it blank.
    pub default_system: String,
    /// Setting used when the caller leaves it blank.
    pub default_setting: String,
}

/// Schema acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// When false, schema generation is skipped and the default schema is
    /// always used.
    pub enabled: bool,
    /// Path to a pre-authored default schema JSON file.
    pub default_schema: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            generation: GenerationSettings::default(),
            schema: SchemaSettings::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 7000,
            request_timeout_secs: 300,
            primer: String::new(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay_secs: 2,
            default_system: "D&D 3.5e".to_string(),
            default_setting: "a generic fantasy setting".to_string(),
        }
    }
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            default_schema: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/lorecraft/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("lorecraft").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

impl LlmConfig {
    /// API key with environment override. `None` when neither is set.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                let key = self.api_key.trim();
                if key.is_empty() {
                    None
                } else {
                    Some(key.to_string())
                }
            })
    }
}
