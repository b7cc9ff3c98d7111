use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use eduquery_core::ranking::top_k;
use eduquery_core::types::{SearchHit, SourceKind};

use crate::matrix::SparseMatrix;
use crate::vectorizer::{TfidfVectorizer, VectorizerOptions};

/// Fitted sparse representation: the vectorizer plus one weighted row per
/// chunk, row i belonging to chunk i.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseIndex {
    pub vectorizer: TfidfVectorizer,
    pub matrix: SparseMatrix,
}

impl SparseIndex {
    pub fn fit<S: AsRef<str>>(options: VectorizerOptions, texts: &[S]) -> Result<Self> {
        let (vectorizer, matrix) = TfidfVectorizer::fit_transform(options, texts)?;
        debug!(rows = matrix.n_rows(), features = matrix.n_features, "fitted tf-idf matrix");
        Ok(Self { vectorizer, matrix })
    }

    /// Consistency of a restored index: a well-formed vectorizer and a
    /// matrix in the same term space.
    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        ensure!(
            self.matrix.n_features == self.vectorizer.n_features(),
            "matrix has {} features, vectorizer has {}",
            self.matrix.n_features,
            self.vectorizer.n_features()
        );
        self.matrix.validate()
    }

    pub fn len(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.n_rows() == 0
    }

    /// Cosine scores of `query` against every row.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let q = self.vectorizer.transform(query);
        self.matrix.linear_kernel(&q)
    }

    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        top_k(&self.scores(query), k)
            .into_iter()
            .map(|(index, score)| SearchHit { index, score, source: SourceKind::Sparse })
            .collect()
    }
}
