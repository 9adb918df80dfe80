//! Generation client trait.
//!
//! The language-model service is opaque to this crate: a compiled prompt
//! goes in, free-form text comes out. Concrete providers (OpenAI chat
//! completions, disabled) live in the `toneweave` app crate. Errors
//! propagate as-is; this core never retries or substitutes content for a
//! failed generation call.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::prompt::CompiledPrompt;

/// Sampling and budget parameters for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on the whole call; exceeding it is a generation failure.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 150,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Trait for generation backends.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one completion over the compiled prompt and return the raw
    /// generated text.
    async fn complete(&self, prompt: &CompiledPrompt, options: &CompletionOptions) -> Result<String>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Box<T> {
    async fn complete(&self, prompt: &CompiledPrompt, options: &CompletionOptions) -> Result<String> {
        (**self).complete(prompt, options).await
    }
}
