//! Candidate retrieval: nearest tone samples for an incoming message.
//!
//! The retriever operates entirely through the [`Store`] and [`Embedder`]
//! traits, with no database or configuration dependencies. It embeds the
//! query once, asks the store for an over-fetched nearest-neighbor pool,
//! and maps index distances to relevance scores for the re-ranker.

use anyhow::Result;

use crate::embedding::Embedder;
use crate::models::CandidateResult;
use crate::store::Store;

/// Fetch the `over_fetch` nearest tone samples to `query_text` within one
/// user's scope.
///
/// Relevance is `1 − distance`, clamped to `[0, 1]`; the distance metric is
/// whatever the store's index uses, and callers must not assume cosine.
///
/// A blank query or a user with zero embedded samples yields an empty
/// sequence, not an error — downstream stages degrade to an example-free
/// prompt.
pub async fn retrieve(
    store: &dyn Store,
    embedder: &dyn Embedder,
    user_id: &str,
    query_text: &str,
    over_fetch: i64,
) -> Result<Vec<CandidateResult>> {
    if query_text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed(query_text).await?;
    let hits = store.nearest_samples(user_id, &query_vec, over_fetch).await?;

    tracing::debug!(
        user_id,
        pool = hits.len(),
        requested = over_fetch,
        "retrieved candidate pool"
    );

    Ok(hits
        .into_iter()
        .map(|hit| CandidateResult {
            text: hit.text,
            relevance: (1.0 - hit.distance).clamp(0.0, 1.0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::models::ToneSample;
    use async_trait::async_trait;

    /// Embedder double returning a fixed vector for any input.
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.0.len()
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    fn sample(id: &str, text: &str, embedding: Vec<f32>) -> ToneSample {
        ToneSample {
            id: id.to_string(),
            user_id: "u1".to_string(),
            text: text.to_string(),
            embedding: Some(embedding),
            category: None,
            politeness: None,
            vibe: None,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_empty_query_returns_empty() {
        let store = InMemoryStore::new();
        let embedder = FixedEmbedder(vec![1.0, 0.0]);
        let result = retrieve(&store, &embedder, "u1", "   ", 10).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_zero_embedded_samples_is_not_an_error() {
        let store = InMemoryStore::new();
        let embedder = FixedEmbedder(vec![1.0, 0.0]);
        let result = retrieve(&store, &embedder, "u1", "free this weekend?", 10)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_relevance_in_unit_interval_and_ordered() {
        let store = InMemoryStore::new();
        store
            .insert_samples(&[
                sample("s1", "near match", vec![1.0, 0.0]),
                sample("s2", "off-axis", vec![0.6, 0.8]),
                sample("s3", "opposite", vec![-1.0, 0.0]),
            ])
            .await
            .unwrap();
        let embedder = FixedEmbedder(vec![1.0, 0.0]);

        let result = retrieve(&store, &embedder, "u1", "hello", 10).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].text, "near match");
        for c in &result {
            assert!((0.0..=1.0).contains(&c.relevance), "relevance {}", c.relevance);
        }
        assert!(result[0].relevance >= result[1].relevance);
        assert!(result[1].relevance >= result[2].relevance);
        // Opposite-direction vector has cosine distance 2; relevance clamps to 0.
        assert_eq!(result[2].relevance, 0.0);
    }
}
