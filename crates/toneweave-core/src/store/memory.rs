//! In-memory [`Store`] implementation for testing and degraded setups.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Nearest-sample search is brute-force cosine over all stored vectors,
//! with distance reported as `1 − cosine`.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    DialogueTurn, PolitenessLevel, RelationshipDescriptor, StyleSummary, ToneSample, VibeType,
};

use super::{PartnerProfile, SampleHit, Store, UserProfile};

struct StoredTurn {
    user_id: String,
    partner_id: String,
    turn: DialogueTurn,
}

/// In-memory store for tests and single-process setups.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserProfile>>,
    partners: RwLock<HashMap<String, PartnerProfile>>,
    relationships: RwLock<HashMap<(String, String), RelationshipDescriptor>>,
    turns: RwLock<Vec<StoredTurn>>,
    samples: RwLock<Vec<ToneSample>>,
    guidelines: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

/// Most frequent value in an iterator, ties broken by first occurrence.
fn dominant<T: Copy + PartialEq>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(v, _)| v)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.users.read().unwrap().get(user_id).cloned())
    }

    async fn get_partner(&self, partner_id: &str) -> Result<Option<PartnerProfile>> {
        Ok(self.partners.read().unwrap().get(partner_id).cloned())
    }

    async fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        self.users
            .write()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn upsert_partner(&self, partner: &PartnerProfile) -> Result<()> {
        self.partners
            .write()
            .unwrap()
            .insert(partner.id.clone(), partner.clone());
        Ok(())
    }

    async fn nearest_samples(
        &self,
        user_id: &str,
        query_vec: &[f32],
        limit: i64,
    ) -> Result<Vec<SampleHit>> {
        let samples = self.samples.read().unwrap();
        let mut hits: Vec<SampleHit> = samples
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                s.embedding.as_ref().map(|vec| SampleHit {
                    sample_id: s.id.clone(),
                    text: s.text.clone(),
                    distance: 1.0 - cosine_sim(query_vec, vec) as f64,
                })
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
        Ok(self
            .relationships
            .read()
            .unwrap()
            .get(&(user_id.to_string(), partner_id.to_string()))
            .copied())
    }

    async fn upsert_relationship(
        &self,
        user_id: &str,
        partner_id: &str,
        descriptor: &RelationshipDescriptor,
    ) -> Result<()> {
        self.relationships
            .write()
            .unwrap()
            .insert((user_id.to_string(), partner_id.to_string()), *descriptor);
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        partner_id: &str,
        limit: i64,
    ) -> Result<Vec<DialogueTurn>> {
        let turns = self.turns.read().unwrap();
        let mut matching: Vec<&StoredTurn> = turns
            .iter()
            .filter(|t| t.user_id == user_id && t.partner_id == partner_id)
            .collect();
        // Most-recent-first, insertion order breaking timestamp ties.
        matching.sort_by_key(|t| std::cmp::Reverse(t.turn.timestamp));
        Ok(matching
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|t| t.turn.clone())
            .collect())
    }

    async fn append_turn(
        &self,
        user_id: &str,
        partner_id: &str,
        turn: &DialogueTurn,
    ) -> Result<()> {
        self.turns.write().unwrap().push(StoredTurn {
            user_id: user_id.to_string(),
            partner_id: partner_id.to_string(),
            turn: turn.clone(),
        });
        Ok(())
    }

    async fn custom_guidelines(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.guidelines.read().unwrap().get(user_id).cloned())
    }

    async fn set_custom_guidelines(&self, user_id: &str, guidelines: Option<&str>) -> Result<()> {
        let mut map = self.guidelines.write().unwrap();
        match guidelines {
            Some(g) => {
                map.insert(user_id.to_string(), g.to_string());
            }
            None => {
                map.remove(user_id);
            }
        }
        Ok(())
    }

    async fn style_summary(&self, user_id: &str) -> Result<StyleSummary> {
        let samples = self.samples.read().unwrap();
        let mine: Vec<&ToneSample> = samples.iter().filter(|s| s.user_id == user_id).collect();

        let politeness: Option<PolitenessLevel> =
            dominant(mine.iter().filter_map(|s| s.politeness));
        let vibe: Option<VibeType> = dominant(mine.iter().filter_map(|s| s.vibe));

        Ok(StyleSummary {
            politeness,
            vibe,
            sample_count: mine.len() as i64,
        })
    }

    async fn insert_samples(&self, samples: &[ToneSample]) -> Result<usize> {
        let mut stored = self.samples.write().unwrap();
        let mut inserted = 0;
        for s in samples {
            if stored
                .iter()
                .any(|existing| existing.user_id == s.user_id && existing.text == s.text)
            {
                continue;
            }
            stored.push(s.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn samples_missing_embedding(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ToneSample>> {
        let samples = self.samples.read().unwrap();
        Ok(samples
            .iter()
            .filter(|s| s.embedding.is_none())
            .filter(|s| user_id.map_or(true, |u| s.user_id == u))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn set_sample_embedding(&self, sample_id: &str, vector: &[f32]) -> Result<()> {
        let mut samples = self.samples.write().unwrap();
        if let Some(s) = samples.iter_mut().find(|s| s.id == sample_id) {
            s.embedding = Some(vector.to_vec());
        }
        Ok(())
    }

    async fn clear_embeddings(&self) -> Result<u64> {
        let mut samples = self.samples.write().unwrap();
        let mut cleared = 0;
        for s in samples.iter_mut() {
            if s.embedding.take().is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}
