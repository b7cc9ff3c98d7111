//! Top-k selection shared by every scoring path.

use std::cmp::Ordering;

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else if score == 0.0 {
        // fold -0.0 into 0.0 so the sign bit never breaks a tie
        0.0
    } else {
        score
    }
}

fn descending(a: f32, b: f32) -> Ordering {
    rank_key(b).total_cmp(&rank_key(a))
}

/// Select the `k` highest scores as `(index, score)` pairs.
///
/// The sort is stable, so exact ties keep ascending index order. NaN
/// scores rank below everything else.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    if k == 0 || scores.is_empty() {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| descending(scores[a], scores[b]));
    order.truncate(k);
    order.into_iter().map(|i| (i, scores[i])).collect()
}

#[cfg(test)]
mod tests {
    use super::top_k;

    #[test]
    fn ties_keep_insertion_order() {
        let picked = top_k(&[0.5, 0.9, 0.5, 0.9, 0.1], 4);
        let idx: Vec<usize> = picked.iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![1, 3, 0, 2]);
    }

    #[test]
    fn k_larger_than_input_returns_everything_once() {
        let picked = top_k(&[0.1, 0.2], 10);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].0, 1);
    }

    #[test]
    fn nan_sinks_and_zero_k_is_empty() {
        let picked = top_k(&[f32::NAN, 0.0, -0.0], 3);
        let idx: Vec<usize> = picked.iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![1, 2, 0]);
        assert!(top_k(&[1.0], 0).is_empty());
    }
}
