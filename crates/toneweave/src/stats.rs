//! Database statistics and health overview.
//!
//! Provides a quick summary of what's stored: user, partner, and sample
//! counts plus embedding coverage. Used by `tone stats` to give confidence
//! that imports and the embedding backfill are working as expected.

use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    let partners: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM partners")
        .fetch_one(&pool)
        .await?;

    let samples: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tone_samples")
        .fetch_one(&pool)
        .await?;

    let embedded: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tone_samples WHERE embedding IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let turns: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dialogue_turns")
        .fetch_one(&pool)
        .await?;

    let with_guidelines: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM style_profiles WHERE custom_guidelines IS NOT NULL",
    )
    .fetch_one(&pool)
    .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Toneweave — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:       {}", config.db.path.display());
    println!("  Size:           {}", format_bytes(db_size));
    println!();
    println!("  Users:          {}", users);
    println!("  Partners:       {}", partners);
    println!("  Dialogue turns: {}", turns);
    println!("  Tone samples:   {}", samples);
    println!(
        "  Embedded:       {} / {} ({}%)",
        embedded,
        samples,
        if samples > 0 {
            (embedded * 100) / samples
        } else {
            0
        }
    );
    println!("  Custom styles:  {}", with_guidelines);

    pool.close().await;
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
