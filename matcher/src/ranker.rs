//! Ranks the candidate pool against a query vector.

use crate::similarity::cosine_similarity;
use fitmatch_core::{MatchCandidate, UserProfile};
use tracing::{debug, info, warn};

/// "Best match only".
pub const DEFAULT_TOP_K: usize = 1;

/// Rank the pool against the query vector, descending by cosine similarity.
///
/// Pool entries whose username equals the query's are excluded (no
/// self-match). Entries whose vector length differs from the query's are
/// skipped with a warning rather than aborting the ranking; a few corrupt
/// persisted rows must not take matching down. Ties keep pool iteration
/// order (stable sort, no secondary key). Returns at most `top_k`
/// candidates; an empty result is a valid "no match" outcome, not an error.
pub fn rank(
    query_username: &str,
    query_vector: &[f32],
    pool: &[(UserProfile, Vec<f32>)],
    top_k: usize,
) -> Vec<MatchCandidate> {
    let mut scored: Vec<(UserProfile, f32)> = Vec::with_capacity(pool.len());

    for (profile, embedding) in pool {
        if profile.username == query_username {
            debug!("Skipping self-match for {}", query_username);
            continue;
        }
        if embedding.len() != query_vector.len() {
            warn!(
                "Skipping candidate {}: embedding dimension {} does not match query dimension {}",
                profile.username,
                embedding.len(),
                query_vector.len()
            );
            continue;
        }

        let score = cosine_similarity(query_vector, embedding);
        scored.push((profile.clone(), score));
    }

    // sort_by is stable: equal scores keep pool order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    let candidates: Vec<MatchCandidate> = scored
        .into_iter()
        .enumerate()
        .map(|(i, (profile, score))| MatchCandidate {
            profile,
            score,
            rank: i + 1,
        })
        .collect();

    info!(
        "Ranked {} candidate(s) for {} (top_k={})",
        candidates.len(),
        query_username,
        top_k
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitmatch_core::sample_data::sample_profiles;

    fn pool_of(entries: &[(&str, Vec<f32>)]) -> Vec<(UserProfile, Vec<f32>)> {
        let samples = sample_profiles();
        entries
            .iter()
            .enumerate()
            .map(|(i, (name, vec))| {
                let mut profile = samples[i % samples.len()].clone();
                profile.username = name.to_string();
                (profile, vec.clone())
            })
            .collect()
    }

    #[test]
    fn best_match_wins() {
        // Scores against [1, 0]: 0.9-ish, ~0.95, 0.2 shaped pool.
        let pool = pool_of(&[
            ("a", vec![0.9, 0.436]),  // cos ≈ 0.90
            ("b", vec![0.95, 0.312]), // cos ≈ 0.95
            ("c", vec![0.2, 0.98]),   // cos ≈ 0.20
        ]);
        let result = rank("query", &[1.0, 0.0], &pool, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].profile.username, "b");
        assert_eq!(result[0].rank, 1);
    }

    #[test]
    fn never_includes_query_identity() {
        let pool = pool_of(&[("query", vec![1.0, 0.0]), ("other", vec![1.0, 0.0])]);
        let result = rank("query", &[1.0, 0.0], &pool, 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].profile.username, "other");
    }

    #[test]
    fn empty_pool_returns_empty() {
        let result = rank("query", &[1.0, 0.0], &[], 1);
        assert!(result.is_empty());
    }

    #[test]
    fn pool_with_only_self_returns_empty() {
        let pool = pool_of(&[("query", vec![1.0, 0.0])]);
        assert!(rank("query", &[1.0, 0.0], &pool, 1).is_empty());
    }

    #[test]
    fn output_sorted_descending_and_bounded_by_top_k() {
        let pool = pool_of(&[
            ("a", vec![0.1, 0.99]),
            ("b", vec![1.0, 0.0]),
            ("c", vec![0.7, 0.71]),
            ("d", vec![0.9, 0.44]),
        ]);
        let result = rank("query", &[1.0, 0.0], &pool, 3);
        assert_eq!(result.len(), 3);
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(result[0].profile.username, "b");
        let ranks: Vec<usize> = result.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn top_k_larger_than_pool_returns_all_eligible() {
        let pool = pool_of(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);
        let result = rank("query", &[1.0, 0.0], &pool, 10);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn dimension_mismatch_skips_only_that_candidate() {
        let pool = pool_of(&[
            ("short", vec![1.0]),
            ("good", vec![0.8, 0.6]),
            ("long", vec![1.0, 0.0, 0.0]),
        ]);
        let result = rank("query", &[1.0, 0.0], &pool, 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].profile.username, "good");
    }

    #[test]
    fn ties_keep_pool_iteration_order() {
        // Both candidates are exactly collinear with the query.
        let pool = pool_of(&[
            ("first", vec![2.0, 0.0]),
            ("second", vec![5.0, 0.0]),
            ("worse", vec![0.0, 1.0]),
        ]);
        let result = rank("query", &[1.0, 0.0], &pool, 3);
        assert_eq!(result[0].profile.username, "first");
        assert_eq!(result[1].profile.username, "second");
        assert_eq!(result[2].profile.username, "worse");
    }
}
