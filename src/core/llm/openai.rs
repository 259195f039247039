//! OpenAI-compatible completion client.
//!
//! Works against any endpoint implementing the `/chat/completions` API
//! (OpenAI, OpenRouter, local proxies).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::LlmConfig;
use crate::core::llm::client::{CompletionClient, LLMError, Result};

const TOP_P: f64 = 0.9;

/// Completion client for OpenAI-compatible chat APIs.
pub struct OpenAICompatibleClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    primer: String,
    client: Client,
}

impl OpenAICompatibleClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens,
            primer: String::new(),
            client,
        }
    }

    /// Build a client from application configuration.
    ///
    /// Fails only when no API key is available from the config file or the
    /// `OPENAI_API_KEY` environment variable.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.resolved_api_key().ok_or(LLMError::MissingApiKey)?;
        let mut client = Self::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.max_tokens,
            Duration::from_secs(config.request_timeout_secs),
        );
        client.primer = config.primer.clone();
        Ok(client)
    }

    /// Set the primer text prepended to every prompt.
    pub fn with_primer(mut self, primer: impl Into<String>) -> Self {
        self.primer = primer.into();
        self
    }

    fn user_content(&self, prompt: &str) -> String {
        if self.primer.trim().is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\n{}", self.primer, prompt)
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatibleClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": self.user_content(prompt) }],
            "max_tokens": self.max_tokens,
            "temperature": temperature,
            "top_p": TOP_P,
            "n": 1,
        });

        tracing::debug!(model = %self.model, temperature, "sending completion request");

        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(LLMError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = resp.json().await?;

        let content = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| LLMError::InvalidResponse("missing message content".to_string()))?;

        Ok(content.trim().to_string())
    }
}
