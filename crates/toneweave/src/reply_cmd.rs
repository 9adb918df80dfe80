//! Reply generation commands: `tone reply single` and `tone reply dual`.
//!
//! Wires the configured store, embedding provider, and generation provider
//! into a [`ReplyEngine`] and runs one request. Output is human-readable by
//! default; `--json` emits the reply plus its context bundle for
//! inspection.

use std::time::Duration;

use anyhow::Result;

use toneweave_core::assemble::AssembleParams;
use toneweave_core::engine::{EngineParams, ReplyEngine};
use toneweave_core::prompt::PromptOptions;

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::sqlite_store::SqliteStore;

fn engine_params(config: &Config) -> EngineParams {
    EngineParams {
        assemble: AssembleParams {
            recent_turn_limit: config.retrieval.recent_turns,
            final_k: config.retrieval.final_k,
            over_fetch_factor: config.retrieval.over_fetch_factor,
            mmr_lambda: config.retrieval.mmr_lambda,
        },
        prompt: PromptOptions {
            default_constraints: config.prompt.default_constraints.clone(),
        },
        temperature: config.generation.temperature,
        max_tokens_single: config.generation.max_tokens_single,
        max_tokens_dual: config.generation.max_tokens_dual,
        generation_timeout: Duration::from_secs(config.generation.timeout_secs),
    }
}

async fn build_engine(
    config: &Config,
) -> Result<
    ReplyEngine<
        SqliteStore,
        Box<dyn toneweave_core::embedding::Embedder>,
        Box<dyn toneweave_core::generation::GenerationClient>,
    >,
> {
    let store = SqliteStore::new(db::connect(config).await?);
    let embedder = create_embedder(&config.embedding)?;
    let generator = create_generator(&config.generation)?;
    Ok(ReplyEngine::new(
        store,
        embedder,
        generator,
        engine_params(config),
    ))
}

pub async fn run_reply_single(
    config: &Config,
    user_id: &str,
    partner_id: &str,
    message: &str,
    json: bool,
) -> Result<()> {
    let engine = build_engine(config).await?;
    let outcome = engine.generate_single_reply(user_id, partner_id, message).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.reply);
    }
    Ok(())
}

pub async fn run_reply_dual(
    config: &Config,
    user_id: &str,
    partner_id: &str,
    message: &str,
    json: bool,
) -> Result<()> {
    let engine = build_engine(config).await?;
    let outcome = engine.generate_dual_reply(user_id, partner_id, message).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("YES: {}", outcome.reply.positive);
        println!("NO: {}", outcome.reply.negative);
    }
    Ok(())
}
