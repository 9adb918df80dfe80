use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create partners table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS partners (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create relationships table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relationships (
            user_id TEXT NOT NULL,
            partner_id TEXT NOT NULL,
            category TEXT NOT NULL,
            politeness TEXT NOT NULL,
            vibe TEXT NOT NULL,
            PRIMARY KEY (user_id, partner_id),
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (partner_id) REFERENCES partners(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create dialogue_turns table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dialogue_turns (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            partner_id TEXT NOT NULL,
            role TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (partner_id) REFERENCES partners(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create tone_samples table; embedding stays NULL until the backfill
    // job writes the complete vector in a single UPDATE.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tone_samples (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            text TEXT NOT NULL,
            category TEXT,
            politeness TEXT,
            vibe TEXT,
            embedding BLOB,
            dedup_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(user_id, dedup_hash),
            FOREIGN KEY (user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create style_profiles table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS style_profiles (
            user_id TEXT PRIMARY KEY,
            custom_guidelines TEXT,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tone_samples_user_id ON tone_samples(user_id)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_dialogue_turns_pair ON dialogue_turns(user_id, partner_id, created_at DESC)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
