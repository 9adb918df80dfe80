//! Context assembly: gather everything one generation call needs.
//!
//! The assembler fails fast on unknown identities — both lookups happen
//! before any embedding or generation call is issued, so a bad request
//! never incurs paid upstream traffic. The remaining reads (recent turns,
//! relationship descriptor, custom guidelines, style summary, and the
//! retrieval-plus-rerank chain) are independent network round trips and
//! run concurrently; this join is the dominant latency lever of the whole
//! pipeline.

use crate::embedding::Embedder;
use crate::error::ReplyError;
use crate::models::GenerationRequest;
use crate::rerank::rerank;
use crate::retrieve::retrieve;
use crate::store::Store;

/// Tuning for context assembly.
#[derive(Debug, Clone)]
pub struct AssembleParams {
    /// Recent dialogue turns to include, newest backwards.
    pub recent_turn_limit: i64,
    /// Final ranked-sample count handed to the prompt compiler.
    pub final_k: usize,
    /// Over-fetch multiplier for the MMR candidate pool.
    pub over_fetch_factor: i64,
    /// MMR relevance/diversity trade-off.
    pub mmr_lambda: f64,
}

impl Default for AssembleParams {
    fn default() -> Self {
        Self {
            recent_turn_limit: 20,
            final_k: 15,
            over_fetch_factor: 10,
            mmr_lambda: 0.9,
        }
    }
}

/// Build a [`GenerationRequest`] for one incoming message.
///
/// Missing relationship records degrade to the default descriptor, and an
/// empty retrieval pool degrades to an example-free request; a missing user
/// or partner is fatal and short-circuits before retrieval.
pub async fn assemble(
    store: &dyn Store,
    embedder: &dyn Embedder,
    params: &AssembleParams,
    user_id: &str,
    partner_id: &str,
    incoming_message: &str,
) -> Result<GenerationRequest, ReplyError> {
    let (user, partner) = futures::join!(store.get_user(user_id), store.get_partner(partner_id));
    let user = user
        .map_err(ReplyError::Upstream)?
        .ok_or_else(|| ReplyError::UserNotFound(user_id.to_string()))?;
    let partner = partner
        .map_err(ReplyError::Upstream)?
        .ok_or_else(|| ReplyError::PartnerNotFound(partner_id.to_string()))?;

    let over_fetch = params.final_k as i64 * params.over_fetch_factor;
    let ranked_samples = async {
        let pool = retrieve(store, embedder, user_id, incoming_message, over_fetch).await?;
        // Pure in-process computation; runs once the retrieval resolves.
        Ok::<_, anyhow::Error>(rerank(&pool, params.final_k, params.mmr_lambda))
    };

    let (turns, relationship, guidelines, summary, samples) = futures::join!(
        store.recent_turns(user_id, partner_id, params.recent_turn_limit),
        store.get_relationship(user_id, partner_id),
        store.custom_guidelines(user_id),
        store.style_summary(user_id),
        ranked_samples,
    );

    let mut recent_turns = turns.map_err(ReplyError::Upstream)?;
    // Fetched most-recent-first; the prompt wants chronological order.
    recent_turns.reverse();

    let relationship = relationship
        .map_err(ReplyError::Upstream)?
        .unwrap_or_default();
    let custom_guidelines = guidelines.map_err(ReplyError::Upstream)?;
    let style_summary = summary.map_err(ReplyError::Upstream)?;
    let samples = samples.map_err(ReplyError::Upstream)?;

    tracing::info!(
        user_id,
        partner_id,
        samples = samples.len(),
        turns = recent_turns.len(),
        has_guidelines = custom_guidelines.is_some(),
        "context assembled"
    );

    Ok(GenerationRequest {
        user_name: user.name,
        samples,
        recent_turns,
        partner_name: partner.name,
        relationship,
        style_summary,
        custom_guidelines,
        incoming_message: incoming_message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DialogueTurn, RelationshipCategory, RelationshipDescriptor, Speaker, ToneSample,
    };
    use crate::store::memory::InMemoryStore;
    use crate::store::{PartnerProfile, UserProfile};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedder double that counts calls and returns a unit vector.
    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .upsert_user(&UserProfile {
                id: "alice".into(),
                name: "Alice".into(),
            })
            .await
            .unwrap();
        store
            .upsert_partner(&PartnerProfile {
                id: "bob".into(),
                name: "Bob".into(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_unknown_user_fails_before_embedding() {
        let store = seeded_store().await;
        let embedder = CountingEmbedder::default();

        let err = assemble(
            &store,
            &embedder,
            &AssembleParams::default(),
            "nobody",
            "bob",
            "hi",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReplyError::UserNotFound(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_partner_fails_before_embedding() {
        let store = seeded_store().await;
        let embedder = CountingEmbedder::default();

        let err = assemble(
            &store,
            &embedder,
            &AssembleParams::default(),
            "alice",
            "stranger",
            "hi",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReplyError::PartnerNotFound(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_relationship_uses_default_descriptor() {
        let store = seeded_store().await;
        let embedder = CountingEmbedder::default();

        let request = assemble(
            &store,
            &embedder,
            &AssembleParams::default(),
            "alice",
            "bob",
            "free this weekend?",
        )
        .await
        .unwrap();

        assert_eq!(request.relationship, RelationshipDescriptor::default());
        assert!(request.samples.is_empty());
        assert!(request.custom_guidelines.is_none());
        assert_eq!(request.user_name, "Alice");
        assert_eq!(request.partner_name, "Bob");
    }

    #[tokio::test]
    async fn test_turns_are_chronological_and_samples_ranked() {
        let store = seeded_store().await;
        store
            .upsert_relationship(
                "alice",
                "bob",
                &RelationshipDescriptor {
                    category: RelationshipCategory::FriendClose,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        for (ts, role, text) in [
            (1, Speaker::Partner, "어제 잘 들어갔어?"),
            (2, Speaker::User, "응 잘 들어갔지"),
            (3, Speaker::Partner, "주말에 볼래?"),
        ] {
            store
                .append_turn(
                    "alice",
                    "bob",
                    &DialogueTurn {
                        role,
                        text: text.into(),
                        timestamp: ts,
                    },
                )
                .await
                .unwrap();
        }
        store
            .insert_samples(&[ToneSample {
                id: "s1".into(),
                user_id: "alice".into(),
                text: "ㅇㅋ 콜".into(),
                embedding: Some(vec![1.0, 0.0]),
                category: None,
                politeness: None,
                vibe: None,
                created_at: 0,
            }])
            .await
            .unwrap();
        let embedder = CountingEmbedder::default();

        let request = assemble(
            &store,
            &embedder,
            &AssembleParams::default(),
            "alice",
            "bob",
            "주말에 볼래?",
        )
        .await
        .unwrap();

        let texts: Vec<&str> = request.recent_turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["어제 잘 들어갔어?", "응 잘 들어갔지", "주말에 볼래?"]
        );
        assert_eq!(request.samples.len(), 1);
        assert_eq!(request.samples[0].text, "ㅇㅋ 콜");
        assert_eq!(
            request.relationship.category,
            RelationshipCategory::FriendClose
        );
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }
}
