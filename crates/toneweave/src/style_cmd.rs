//! Custom style-guideline management: `tone style set|show|clear`.
//!
//! Guidelines set here are rendered verbatim into the prompt under the
//! must-strictly-follow heading and suppress the default constraint block
//! entirely. Clearing resets the user to the default constraints.

use anyhow::{bail, Result};

use toneweave_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

pub async fn run_style_set(config: &Config, user_id: &str, guidelines: &str) -> Result<()> {
    if guidelines.trim().is_empty() {
        bail!("Guidelines must not be empty; use `tone style clear` to reset");
    }

    let store = open(config).await?;
    ensure_user(&store, user_id).await?;
    store
        .set_custom_guidelines(user_id, Some(guidelines.trim()))
        .await?;

    println!("style guidelines set for {}", user_id);
    Ok(())
}

pub async fn run_style_show(config: &Config, user_id: &str) -> Result<()> {
    let store = open(config).await?;
    ensure_user(&store, user_id).await?;

    match store.custom_guidelines(user_id).await? {
        Some(guidelines) => {
            println!("{}", guidelines);
        }
        None => {
            println!("(no custom guidelines — default constraints apply)");
        }
    }
    Ok(())
}

pub async fn run_style_clear(config: &Config, user_id: &str) -> Result<()> {
    let store = open(config).await?;
    ensure_user(&store, user_id).await?;
    store.set_custom_guidelines(user_id, None).await?;

    println!("style guidelines cleared for {}", user_id);
    Ok(())
}

async fn open(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::new(db::connect(config).await?))
}

async fn ensure_user(store: &SqliteStore, user_id: &str) -> Result<()> {
    if store.get_user(user_id).await?.is_none() {
        bail!("user not found: {}", user_id);
    }
    Ok(())
}
