//! Reply engine: the surface this crate exposes to callers.
//!
//! Wires the assembler, prompt compiler, generation client, and dual-reply
//! parser into the two operations external layers call:
//! [`generate_single_reply`](ReplyEngine::generate_single_reply) and
//! [`generate_dual_reply`](ReplyEngine::generate_dual_reply). Each inbound
//! request is one logical task; engines share no mutable state and may be
//! used concurrently.

use std::time::Duration;

use serde::Serialize;

use crate::assemble::{assemble, AssembleParams};
use crate::embedding::Embedder;
use crate::error::ReplyError;
use crate::generation::{CompletionOptions, GenerationClient};
use crate::models::{DualReply, GenerationRequest};
use crate::parse::parse_dual_reply;
use crate::prompt::{compile, CompiledPrompt, PromptOptions, ReplyMode};
use crate::store::Store;

/// Engine tuning: assembly parameters, prompt overrides, and generation
/// sampling knobs.
#[derive(Debug, Clone)]
pub struct EngineParams {
    pub assemble: AssembleParams,
    pub prompt: PromptOptions,
    pub temperature: f32,
    /// Token budget for a single reply.
    pub max_tokens_single: u32,
    /// Token budget for the dual (positive + negative) reply pair.
    pub max_tokens_dual: u32,
    pub generation_timeout: Duration,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            assemble: AssembleParams::default(),
            prompt: PromptOptions::default(),
            temperature: 0.7,
            max_tokens_single: 100,
            max_tokens_dual: 150,
            generation_timeout: Duration::from_secs(30),
        }
    }
}

/// Context bundle echoed back with every reply for inspection/debugging:
/// what the generator was actually shown.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyContext {
    pub recent_messages: Vec<String>,
    pub style_examples: Vec<String>,
    pub style_summary: String,
    pub receiver: String,
}

impl ReplyContext {
    fn from_request(request: &GenerationRequest) -> Self {
        Self {
            recent_messages: request.recent_turns.iter().map(|t| t.text.clone()).collect(),
            style_examples: request.samples.iter().map(|c| c.text.clone()).collect(),
            style_summary: request.style_summary.characteristics().join(", "),
            receiver: format!(
                "{} ({})",
                request.partner_name,
                request.relationship.category.tag()
            ),
        }
    }
}

/// A single generated reply plus its context bundle.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyOutcome {
    pub reply: String,
    pub context: ReplyContext,
}

/// A dual (positive/negative) reply pair plus its context bundle.
#[derive(Debug, Clone, Serialize)]
pub struct DualReplyOutcome {
    pub reply: DualReply,
    pub context: ReplyContext,
}

/// The reply-generation pipeline over pluggable store, embedder, and
/// generation backends.
pub struct ReplyEngine<S, E, G> {
    store: S,
    embedder: E,
    generator: G,
    params: EngineParams,
}

impl<S: Store, E: Embedder, G: GenerationClient> ReplyEngine<S, E, G> {
    pub fn new(store: S, embedder: E, generator: G, params: EngineParams) -> Self {
        Self {
            store,
            embedder,
            generator,
            params,
        }
    }

    /// Draft one style-faithful reply to `message`.
    pub async fn generate_single_reply(
        &self,
        user_id: &str,
        partner_id: &str,
        message: &str,
    ) -> Result<ReplyOutcome, ReplyError> {
        let request = self.assemble_request(user_id, partner_id, message).await?;
        let raw = self
            .complete(&request, ReplyMode::Single, self.params.max_tokens_single)
            .await?;

        Ok(ReplyOutcome {
            reply: raw.trim().to_string(),
            context: ReplyContext::from_request(&request),
        })
    }

    /// Draft an agreeing and a declining reply to `message`.
    ///
    /// Parsing of the generated pair never fails; malformed generations
    /// degrade through the parser's fallback ladder.
    pub async fn generate_dual_reply(
        &self,
        user_id: &str,
        partner_id: &str,
        message: &str,
    ) -> Result<DualReplyOutcome, ReplyError> {
        let request = self.assemble_request(user_id, partner_id, message).await?;
        let raw = self
            .complete(&request, ReplyMode::Dual, self.params.max_tokens_dual)
            .await?;
        let reply = parse_dual_reply(&raw);

        tracing::info!(
            user_id,
            partner_id,
            positive = %reply.positive,
            negative = %reply.negative,
            "dual reply generated"
        );

        Ok(DualReplyOutcome {
            reply,
            context: ReplyContext::from_request(&request),
        })
    }

    async fn assemble_request(
        &self,
        user_id: &str,
        partner_id: &str,
        message: &str,
    ) -> Result<GenerationRequest, ReplyError> {
        assemble(
            &self.store,
            &self.embedder,
            &self.params.assemble,
            user_id,
            partner_id,
            message,
        )
        .await
    }

    async fn complete(
        &self,
        request: &GenerationRequest,
        mode: ReplyMode,
        max_tokens: u32,
    ) -> Result<String, ReplyError> {
        let prompt: CompiledPrompt = compile(request, mode, &self.params.prompt);
        tracing::debug!(system_len = prompt.system.len(), "prompt compiled");

        let options = CompletionOptions {
            temperature: self.params.temperature,
            max_tokens,
            timeout: self.params.generation_timeout,
        };

        self.generator
            .complete(&prompt, &options)
            .await
            .map_err(ReplyError::Generation)
    }
}
