//! Embedding backfill commands: `tone embed pending` and `tone embed rebuild`.
//!
//! Sample ingestion writes tone samples without vectors; this job embeds
//! them in batches after the fact. Each vector is written with a single
//! per-row UPDATE, so the concurrent read path only ever observes "no
//! embedding" (excluded from retrieval) or a complete vector.

use anyhow::{bail, Result};

use toneweave_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::sqlite_store::SqliteStore;

/// Find and embed tone samples that are missing embeddings.
pub async fn run_embed_pending(
    config: &Config,
    user_id: Option<&str>,
    limit: Option<i64>,
    dry_run: bool,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let embedder = create_embedder(&config.embedding)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let fetch_limit = limit.unwrap_or(i64::MAX);
    let pending = store.samples_missing_embedding(user_id, fetch_limit).await?;

    if dry_run {
        println!("embed pending (dry-run)");
        println!("  samples needing embeddings: {}", pending.len());
        return Ok(());
    }

    if pending.is_empty() {
        println!("embed pending");
        println!("  all samples up to date");
        return Ok(());
    }

    let total = pending.len();
    let mut embedded = 0u64;
    let mut failed = 0u64;

    tracing::info!(
        pending = total,
        model = embedder.model_name(),
        "embedding backfill started"
    );

    for batch in pending.chunks(config.embedding.batch_size) {
        let texts: Vec<String> = batch.iter().map(|s| s.text.clone()).collect();

        match embedder.embed_batch(&texts).await {
            Ok(vectors) => {
                for (sample, vec) in batch.iter().zip(vectors.iter()) {
                    store.set_sample_embedding(&sample.id, vec).await?;
                    embedded += 1;
                }
            }
            Err(e) => {
                // The whole batch fails together; later batches still run.
                eprintln!("Warning: embedding batch failed: {}", e);
                failed += batch.len() as u64;
            }
        }
    }

    println!("embed pending");
    println!("  total pending: {}", total);
    println!("  embedded: {}", embedded);
    println!("  failed: {}", failed);

    Ok(())
}

/// Delete all embeddings and regenerate them from scratch.
pub async fn run_embed_rebuild(config: &Config) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let cleared = store.clear_embeddings().await?;
    println!("embed rebuild — cleared {} existing embeddings", cleared);

    drop(store);
    run_embed_pending(config, None, None, false).await
}
