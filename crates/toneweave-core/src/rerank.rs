//! Diversity-aware re-ranking with Maximal Marginal Relevance (MMR).
//!
//! Vector retrieval alone tends to return near-duplicate utterances —
//! fifteen variants of the same greeting teach the generator nothing about
//! the user's range. MMR re-scores an over-fetched candidate pool so that
//! each pick balances relevance to the query against redundancy with what
//! has already been selected:
//!
//! ```text
//! score = λ·relevance − (1−λ)·max_similarity_to_selected
//! ```
//!
//! λ → 1 keeps pure relevance order; λ → 0 maximizes lexical spread. The
//! default of 0.9 keeps diversity as a tie-breaker rather than a primary
//! objective — semantic fidelity to the query must dominate.
//!
//! Pairwise similarity between texts uses a cheap surrogate (first-character
//! bonus, relative length delta, character-set Jaccard) rather than a second
//! embedding call per comparison. Swapping in embedding-space similarity is
//! a drop-in change if per-sample vectors are ever cached alongside the
//! candidate texts.

use crate::models::CandidateResult;

/// Greedily select `k` candidates balancing relevance against redundancy.
///
/// Returns exactly `min(k, candidates.len())` items, each drawn from the
/// input without duplication, in selection order (first selected = most
/// valuable). Ties are broken by earliest position in the input, so the
/// function is deterministic for identical inputs.
///
/// `lambda` is clamped to `[0, 1]`.
pub fn rerank(candidates: &[CandidateResult], k: usize, lambda: f64) -> Vec<CandidateResult> {
    let lambda = lambda.clamp(0.0, 1.0);
    let mut selected: Vec<CandidateResult> = Vec::with_capacity(k.min(candidates.len()));
    let mut remaining: Vec<&CandidateResult> = candidates.iter().collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f64::NEG_INFINITY;

        for (i, candidate) in remaining.iter().enumerate() {
            let max_similarity = selected
                .iter()
                .map(|sel| pairwise_similarity(&candidate.text, &sel.text))
                .fold(0.0f64, f64::max);

            let score = lambda * candidate.relevance - (1.0 - lambda) * max_similarity;

            // Strict comparison keeps the earliest candidate on ties.
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }

        selected.push(remaining.remove(best_idx).clone());
    }

    selected
}

/// Surrogate text similarity in `[0, 1]`: `1 − diversity`.
///
/// Meant to penalize near-identical phrasing cheaply, not to approximate
/// semantic distance.
fn pairwise_similarity(a: &str, b: &str) -> f64 {
    1.0 - diversity(a, b)
}

/// Surrogate diversity between two texts, in `[0, 1]`.
///
/// Components:
/// - a 0.5 bonus when the first characters differ (visibly different
///   openings),
/// - relative length difference, weighted 0.3,
/// - one minus the character-set Jaccard similarity, weighted 0.2.
fn diversity(a: &str, b: &str) -> f64 {
    let first_a = a.chars().next();
    let first_b = b.chars().next();
    let first_char_bonus = if first_a != first_b { 0.5 } else { 0.0 };

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    let length_diff = if max_len == 0 {
        0.0
    } else {
        (len_a as f64 - len_b as f64).abs() / max_len as f64
    };

    let chars_a: std::collections::HashSet<char> = a.chars().collect();
    let chars_b: std::collections::HashSet<char> = b.chars().collect();
    let union = chars_a.union(&chars_b).count();
    let jaccard = if union == 0 {
        // Two empty texts are identical, not diverse.
        1.0
    } else {
        chars_a.intersection(&chars_b).count() as f64 / union as f64
    };

    (first_char_bonus + length_diff * 0.3 + (1.0 - jaccard) * 0.2).min(1.0)
}
