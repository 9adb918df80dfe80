//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation to SQL against the schema created by
//! [`crate::migrate`]. Vector search is brute-force cosine over the BLOB
//! embeddings, computed in-process; the store contract only promises an
//! ordered candidate set, so an ANN-capable engine can replace this without
//! touching the pipeline.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use toneweave_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use toneweave_core::models::{
    DialogueTurn, PolitenessLevel, RelationshipCategory, RelationshipDescriptor, Speaker,
    StyleSummary, ToneSample, VibeType,
};
use toneweave_core::store::{PartnerProfile, SampleHit, Store, UserProfile};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn speaker_tag(role: Speaker) -> &'static str {
    match role {
        Speaker::User => "user",
        Speaker::Partner => "partner",
    }
}

fn speaker_from_tag(tag: &str) -> Speaker {
    if tag == "user" {
        Speaker::User
    } else {
        Speaker::Partner
    }
}

fn sample_from_row(row: &sqlx::sqlite::SqliteRow) -> ToneSample {
    let embedding: Option<Vec<u8>> = row.get("embedding");
    let category: Option<String> = row.get("category");
    let politeness: Option<String> = row.get("politeness");
    let vibe: Option<String> = row.get("vibe");

    ToneSample {
        id: row.get("id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        embedding: embedding.map(|blob| blob_to_vec(&blob)),
        category: category.as_deref().and_then(RelationshipCategory::from_tag),
        politeness: politeness.as_deref().and_then(PolitenessLevel::from_tag),
        vibe: vibe.as_deref().and_then(VibeType::from_tag),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, name FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserProfile {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }

    async fn get_partner(&self, partner_id: &str) -> Result<Option<PartnerProfile>> {
        let row = sqlx::query("SELECT id, name FROM partners WHERE id = ?")
            .bind(partner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| PartnerProfile {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }

    async fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_partner(&self, partner: &PartnerProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO partners (id, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&partner.id)
        .bind(&partner.name)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn nearest_samples(
        &self,
        user_id: &str,
        query_vec: &[f32],
        limit: i64,
    ) -> Result<Vec<SampleHit>> {
        let rows = sqlx::query(
            "SELECT id, text, embedding FROM tone_samples WHERE user_id = ? AND embedding IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<SampleHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                let similarity = cosine_similarity(query_vec, &vec) as f64;
                SampleHit {
                    sample_id: row.get("id"),
                    text: row.get("text"),
                    distance: 1.0 - similarity,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit.max(0) as usize);

        Ok(hits)
    }

    async fn get_relationship(
        &self,
        user_id: &str,
        partner_id: &str,
    ) -> Result<Option<RelationshipDescriptor>> {
        let row = sqlx::query(
            "SELECT category, politeness, vibe FROM relationships WHERE user_id = ? AND partner_id = ?",
        )
        .bind(user_id)
        .bind(partner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let fallback = RelationshipDescriptor::default();
            let category: String = r.get("category");
            let politeness: String = r.get("politeness");
            let vibe: String = r.get("vibe");
            RelationshipDescriptor {
                category: RelationshipCategory::from_tag(&category).unwrap_or(fallback.category),
                politeness: PolitenessLevel::from_tag(&politeness).unwrap_or(fallback.politeness),
                vibe: VibeType::from_tag(&vibe).unwrap_or(fallback.vibe),
            }
        }))
    }

    async fn upsert_relationship(
        &self,
        user_id: &str,
        partner_id: &str,
        descriptor: &RelationshipDescriptor,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO relationships (user_id, partner_id, category, politeness, vibe)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, partner_id) DO UPDATE SET
                category = excluded.category,
                politeness = excluded.politeness,
                vibe = excluded.vibe
            "#,
        )
        .bind(user_id)
        .bind(partner_id)
        .bind(descriptor.category.tag())
        .bind(descriptor.politeness.tag())
        .bind(descriptor.vibe.tag())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        partner_id: &str,
        limit: i64,
    ) -> Result<Vec<DialogueTurn>> {
        let rows = sqlx::query(
            r#"
            SELECT role, text, created_at
            FROM dialogue_turns
            WHERE user_id = ? AND partner_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(partner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let role: String = row.get("role");
                DialogueTurn {
                    role: speaker_from_tag(&role),
                    text: row.get("text"),
                    timestamp: row.get("created_at"),
                }
            })
            .collect())
    }

    async fn append_turn(
        &self,
        user_id: &str,
        partner_id: &str,
        turn: &DialogueTurn,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO dialogue_turns (id, user_id, partner_id, role, text, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(partner_id)
        .bind(speaker_tag(turn.role))
        .bind(&turn.text)
        .bind(turn.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn custom_guidelines(&self, user_id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT custom_guidelines FROM style_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| r.get::<Option<String>, _>("custom_guidelines")))
    }

    async fn set_custom_guidelines(&self, user_id: &str, guidelines: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO style_profiles (user_id, custom_guidelines, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                custom_guidelines = excluded.custom_guidelines,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(guidelines)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn style_summary(&self, user_id: &str) -> Result<StyleSummary> {
        let politeness: Option<String> = sqlx::query_scalar(
            r#"
            SELECT politeness FROM tone_samples
            WHERE user_id = ? AND politeness IS NOT NULL
            GROUP BY politeness
            ORDER BY COUNT(*) DESC, politeness ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let vibe: Option<String> = sqlx::query_scalar(
            r#"
            SELECT vibe FROM tone_samples
            WHERE user_id = ? AND vibe IS NOT NULL
            GROUP BY vibe
            ORDER BY COUNT(*) DESC, vibe ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let sample_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tone_samples WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(StyleSummary {
            politeness: politeness.as_deref().and_then(PolitenessLevel::from_tag),
            vibe: vibe.as_deref().and_then(VibeType::from_tag),
            sample_count,
        })
    }

    async fn insert_samples(&self, samples: &[ToneSample]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for sample in samples {
            let dedup_hash = crate::import::dedup_hash(&sample.user_id, &sample.text);
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO tone_samples
                    (id, user_id, text, category, politeness, vibe, embedding, dedup_hash, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sample.id)
            .bind(&sample.user_id)
            .bind(&sample.text)
            .bind(sample.category.map(|c| c.tag()))
            .bind(sample.politeness.map(|p| p.tag()))
            .bind(sample.vibe.map(|v| v.tag()))
            .bind(sample.embedding.as_deref().map(vec_to_blob))
            .bind(&dedup_hash)
            .bind(sample.created_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn samples_missing_embedding(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ToneSample>> {
        let rows = match user_id {
            Some(uid) => {
                sqlx::query(
                    r#"
                    SELECT id, user_id, text, category, politeness, vibe, embedding, created_at
                    FROM tone_samples
                    WHERE embedding IS NULL AND user_id = ?
                    ORDER BY created_at ASC
                    LIMIT ?
                    "#,
                )
                .bind(uid)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, user_id, text, category, politeness, vibe, embedding, created_at
                    FROM tone_samples
                    WHERE embedding IS NULL
                    ORDER BY created_at ASC
                    LIMIT ?
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(sample_from_row).collect())
    }

    async fn set_sample_embedding(&self, sample_id: &str, vector: &[f32]) -> Result<()> {
        // Single UPDATE per row: readers see either NULL or the whole vector.
        sqlx::query("UPDATE tone_samples SET embedding = ? WHERE id = ?")
            .bind(vec_to_blob(vector))
            .bind(sample_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear_embeddings(&self) -> Result<u64> {
        let result =
            sqlx::query("UPDATE tone_samples SET embedding = NULL WHERE embedding IS NOT NULL")
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
