use eduquery_core::ranking::top_k;
use eduquery_core::types::{SearchHit, SourceKind};

pub type DenseMatrix = Vec<Vec<f32>>;

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Inner product of `query` against every row, then stable top-k.
pub fn brute_force_search(rows: &[Vec<f32>], query: &[f32], k: usize) -> Vec<SearchHit> {
    let scores: Vec<f32> = rows.iter().map(|r| dot(r, query)).collect();
    top_k(&scores, k)
        .into_iter()
        .map(|(index, score)| SearchHit { index, score, source: SourceKind::Dense })
        .collect()
}
