//! Tone-sample import: `tone import <file> --user <id>`.
//!
//! Loads samples from a JSON Lines file, one record per line:
//!
//! ```text
//! {"text": "ㅇㅋ 바로 갈게", "category": "FRIEND_CLOSE", "politeness": "CASUAL", "vibe": "PLAYFUL"}
//! ```
//!
//! Records get UUIDs and a sha-256 dedup hash; re-importing the same file
//! is a no-op. Embeddings are not computed here — run `tone embed pending`
//! afterwards. (Parsing exported chat transcripts into such files is a
//! separate concern and lives outside this tool.)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use toneweave_core::models::{PolitenessLevel, RelationshipCategory, ToneSample, VibeType};
use toneweave_core::store::{Store, UserProfile};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// One JSONL import record.
#[derive(Debug, Deserialize)]
struct SampleRecord {
    text: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    politeness: Option<String>,
    #[serde(default)]
    vibe: Option<String>,
}

/// Dedup hash over the owning user and the exact sample text.
pub fn dedup_hash(user_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b"\x00");
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Run the import command.
///
/// Creates the user row if it does not exist yet (`user_name` defaults to
/// the user id), then bulk-inserts the samples with duplicates skipped.
pub async fn run_import(
    config: &Config,
    path: &Path,
    user_id: &str,
    user_name: Option<&str>,
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;

    let now = chrono::Utc::now().timestamp();
    let mut samples = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: SampleRecord = serde_json::from_str(line)
            .with_context(|| format!("Invalid record on line {}", line_no + 1))?;

        if record.text.trim().is_empty() {
            bail!("Empty sample text on line {}", line_no + 1);
        }

        samples.push(ToneSample {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            text: record.text,
            embedding: None,
            category: record
                .category
                .as_deref()
                .and_then(RelationshipCategory::from_tag),
            politeness: record
                .politeness
                .as_deref()
                .and_then(PolitenessLevel::from_tag),
            vibe: record.vibe.as_deref().and_then(VibeType::from_tag),
            created_at: now,
        });
    }

    if samples.is_empty() {
        bail!("No samples found in {}", path.display());
    }

    tracing::info!(user_id, records = samples.len(), "importing tone samples");

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    if store.get_user(user_id).await?.is_none() {
        store
            .upsert_user(&UserProfile {
                id: user_id.to_string(),
                name: user_name.unwrap_or(user_id).to_string(),
            })
            .await?;
    }

    let inserted = store.insert_samples(&samples).await?;

    println!("import");
    println!("  file: {}", path.display());
    println!("  records: {}", samples.len());
    println!("  inserted: {}", inserted);
    println!("  skipped (duplicates): {}", samples.len() - inserted);

    Ok(())
}
