//! Storage abstraction for Toneweave.
//!
//! The [`Store`] trait defines every storage operation the reply pipeline
//! needs, enabling pluggable backends (SQLite, in-memory). From the
//! pipeline's perspective all rows are read-only during a request; the
//! write operations exist for ingestion tooling and the embedding backfill
//! job, which run disjoint from the read path.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DialogueTurn, RelationshipDescriptor, StyleSummary, ToneSample};

/// A nearest-neighbor hit from the sample index.
///
/// `distance` uses whatever metric the backend indexes by, with smaller
/// meaning closer. Callers must not assume cosine unless the backend
/// documents it.
#[derive(Debug, Clone)]
pub struct SampleHit {
    pub sample_id: String,
    pub text: String,
    pub distance: f64,
}

/// A registered user whose style the engine imitates.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    /// Display name used in the identity framing of compiled prompts.
    pub name: String,
}

/// A conversation partner the user exchanges messages with.
#[derive(Debug, Clone)]
pub struct PartnerProfile {
    pub id: String,
    pub name: String,
}

/// Abstract storage backend for the reply pipeline.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_user`](Store::get_user) / [`get_partner`](Store::get_partner) | Identity lookups, checked before any paid call |
/// | [`nearest_samples`](Store::nearest_samples) | k-NN over embedded tone samples, ascending distance |
/// | [`get_relationship`](Store::get_relationship) | Relationship descriptor for a (user, partner) pair |
/// | [`recent_turns`](Store::recent_turns) | Recent dialogue, most-recent-first |
/// | [`custom_guidelines`](Store::custom_guidelines) / [`set_custom_guidelines`](Store::set_custom_guidelines) | User-authored style overrides |
/// | [`style_summary`](Store::style_summary) | Aggregated politeness/vibe statistics |
/// | [`insert_samples`](Store::insert_samples) | Bulk sample ingestion (embeddings absent) |
/// | [`samples_missing_embedding`](Store::samples_missing_embedding) / [`set_sample_embedding`](Store::set_sample_embedding) | Backfill job support; vectors are written atomically per row |
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a user by id.
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Look up a partner by id.
    async fn get_partner(&self, partner_id: &str) -> Result<Option<PartnerProfile>>;

    /// Create or replace a user row.
    async fn upsert_user(&self, user: &UserProfile) -> Result<()>;

    /// Create or replace a partner row.
    async fn upsert_partner(&self, partner: &PartnerProfile) -> Result<()>;

    /// Return the `limit` nearest tone samples to `query_vec`, scoped to
    /// `user_id` and to samples whose embedding is present, ordered by
    /// ascending distance.
    async fn nearest_samples(
        &self,
        user_id: &str,
        query_vec: &[f32],
        limit: i64,
    ) -> Result<Vec<SampleHit>>;

    /// The relationship descriptor for a (user, partner) pair, if recorded.
    async fn get_relationship(
        &self,
        user_id: &str,
        partner_id: &str,
    ) -> Result<Option<RelationshipDescriptor>>;

    /// Create or replace a relationship descriptor.
    async fn upsert_relationship(
        &self,
        user_id: &str,
        partner_id: &str,
        descriptor: &RelationshipDescriptor,
    ) -> Result<()>;

    /// The most recent `limit` dialogue turns between user and partner,
    /// most-recent-first. The assembler reverses them to chronological
    /// order.
    async fn recent_turns(
        &self,
        user_id: &str,
        partner_id: &str,
        limit: i64,
    ) -> Result<Vec<DialogueTurn>>;

    /// Append one dialogue turn.
    async fn append_turn(
        &self,
        user_id: &str,
        partner_id: &str,
        turn: &DialogueTurn,
    ) -> Result<()>;

    /// User-authored custom style guidelines, if any.
    async fn custom_guidelines(&self, user_id: &str) -> Result<Option<String>>;

    /// Set (`Some`) or reset (`None`) the custom style guidelines.
    async fn set_custom_guidelines(&self, user_id: &str, guidelines: Option<&str>) -> Result<()>;

    /// Aggregate the dominant politeness register and vibe across the
    /// user's tone samples.
    async fn style_summary(&self, user_id: &str) -> Result<StyleSummary>;

    /// Bulk-insert tone samples, returning how many were newly stored
    /// (duplicates may be skipped by the backend).
    async fn insert_samples(&self, samples: &[ToneSample]) -> Result<usize>;

    /// Samples that still lack an embedding, optionally scoped to one user.
    async fn samples_missing_embedding(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ToneSample>>;

    /// Store the embedding vector for one sample. The write must be atomic
    /// per row: a concurrent reader sees either no embedding or the whole
    /// vector.
    async fn set_sample_embedding(&self, sample_id: &str, vector: &[f32]) -> Result<()>;

    /// Delete all stored embeddings (used by `embed rebuild`), returning
    /// how many rows were cleared.
    async fn clear_embeddings(&self) -> Result<u64>;
}
