//! Pure vector similarity math.

/// Cosine similarity between two equal-length vectors, in [-1, 1].
///
/// Unequal lengths are a caller error and panic. A zero-norm operand has no
/// direction; the result is defined as 0.0 (maximally dissimilar) rather
/// than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "cosine_similarity requires equal-length vectors ({} vs {})",
        a.len(),
        b.len()
    );

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.5, -1.0, 2.0, 0.25];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < TOLERANCE);
    }

    #[test]
    fn symmetry() {
        let a = vec![0.3, 0.7, -0.2, 1.1];
        let b = vec![-0.5, 0.9, 0.4, 0.1];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn result_stays_in_range() {
        let a = vec![3.0, -4.0, 12.0];
        let b = vec![-7.0, 2.0, 0.5];
        let s = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn zero_norm_operand_scores_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    #[should_panic(expected = "equal-length")]
    fn length_mismatch_panics() {
        cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
    }
}
