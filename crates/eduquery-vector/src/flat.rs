use anyhow::{bail, Result};

use eduquery_core::ranking::top_k;
use eduquery_core::traits::VectorSearch;

/// Exact inner-product search over vectors packed row-major into one
/// buffer. Row ids are insertion positions.
#[derive(Debug, Clone, Default)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }
}

impl VectorSearch for FlatIpIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if self.dim == 0 {
            bail!("flat index created with dim 0");
        }
        if let Some(bad) = vectors.iter().position(|v| v.len() != self.dim) {
            bail!("vector {} has dim {}, index dim is {}", bad, vectors[bad].len(), self.dim);
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            bail!("query has dim {}, index dim is {}", query.len(), self.dim);
        }
        let scores: Vec<f32> = (0..self.len())
            .map(|i| self.row(i).iter().zip(query).map(|(x, y)| x * y).sum())
            .collect();
        Ok(top_k(&scores, k))
    }
}
