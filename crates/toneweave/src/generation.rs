//! Generation provider implementations.
//!
//! Implements the core [`GenerationClient`] trait:
//! - **[`DisabledGenerator`]** — returns errors; used when generation is not configured.
//! - **[`OpenAiGenerator`]** — calls the OpenAI chat completions API.
//!
//! Unlike the embedding provider there is no internal retry here: a failed
//! or timed-out generation surfaces to the caller as a retryable failure,
//! and retry policy belongs to the caller's layer.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use toneweave_core::generation::{CompletionOptions, GenerationClient};
use toneweave_core::prompt::CompiledPrompt;

use crate::config::GenerationConfig;

/// A no-op generation provider that always returns errors.
pub struct DisabledGenerator;

#[async_trait]
impl GenerationClient for DisabledGenerator {
    async fn complete(
        &self,
        _prompt: &CompiledPrompt,
        _options: &CompletionOptions,
    ) -> Result<String> {
        bail!("Generation provider is disabled")
    }
}

/// Generation provider using the OpenAI chat completions API.
///
/// Sends the compiled system/user prompt pair to `POST /v1/chat/completions`
/// with the configured model. Requires the `OPENAI_API_KEY` environment
/// variable to be set.
pub struct OpenAiGenerator {
    model: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Create a new OpenAI generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        Ok(Self {
            model: config.model.clone(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAiGenerator {
    async fn complete(
        &self,
        prompt: &CompiledPrompt,
        options: &CompletionOptions,
    ) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await
            .context("generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat completion response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))
}

/// Create the appropriate [`GenerationClient`] based on configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn GenerationClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai" => Ok(Box::new(OpenAiGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
