use serde::{Deserialize, Serialize};

/// A sparse row: strictly increasing term indices with their weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVec {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVec {
    /// Build from unordered `(term, weight)` pairs; pairs must have
    /// distinct terms.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_by_key(|(i, _)| *i);
        let (indices, values) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit length. The zero vector is left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Inner product by merging the two index lists.
    pub fn dot(&self, other: &SparseVec) -> f32 {
        let (mut i, mut j, mut acc) = (0usize, 0usize, 0f32);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }
}

/// Document-term weights, one row per chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    pub n_features: usize,
    pub rows: Vec<SparseVec>,
}

impl SparseMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Every row has matching index and value lists, strictly increasing
    /// indices below `n_features`, and finite weights.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (r, row) in self.rows.iter().enumerate() {
            anyhow::ensure!(row.indices.len() == row.values.len(), "row {} has {} indices but {} values", r, row.indices.len(), row.values.len());
            anyhow::ensure!(row.indices.windows(2).all(|w| w[0] < w[1]), "row {} indices are not strictly increasing", r);
            if let Some(&last) = row.indices.last() {
                anyhow::ensure!((last as usize) < self.n_features, "row {} references term {} beyond {} features", r, last, self.n_features);
            }
            anyhow::ensure!(row.values.iter().all(|v| v.is_finite()), "row {} has a non-finite weight", r);
        }
        Ok(())
    }

    /// Linear kernel of `query` against every row. With L2-normalised
    /// rows this is cosine similarity.
    pub fn linear_kernel(&self, query: &SparseVec) -> Vec<f32> {
        self.rows.iter().map(|row| row.dot(query)).collect()
    }
}
