use serde::{Deserialize, Serialize};

use eduquery_core::traits::VectorSearch;
use eduquery_core::types::SourceKind;
use eduquery_text::SparseIndex;
use eduquery_vector::DenseMatrix;

/// Dense representation: unit rows aligned with the chunk collection.
pub struct DenseState {
    pub embedder_id: String,
    pub vectors: DenseMatrix,
    /// Accelerated search over `vectors`; `None` means brute force.
    pub search: Option<Box<dyn VectorSearch>>,
}

impl DenseState {
    pub fn dim(&self) -> usize {
        self.vectors.first().map(Vec::len).unwrap_or(0)
    }
}

impl std::fmt::Debug for DenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseState")
            .field("embedder_id", &self.embedder_id)
            .field("rows", &self.vectors.len())
            .field("dim", &self.dim())
            .field("accelerated", &self.search.is_some())
            .finish()
    }
}

/// The active similarity representation. Queries switch on this tag; the
/// embedding capability is only probed when one is built.
#[derive(Debug)]
pub enum RetrievalMode {
    Dense(DenseState),
    Sparse(SparseIndex),
    /// Both paths failed for this collection; queries return the earliest
    /// chunks.
    Unindexed,
}

impl RetrievalMode {
    pub fn source(&self) -> SourceKind {
        match self {
            RetrievalMode::Dense(_) => SourceKind::Dense,
            RetrievalMode::Sparse(_) => SourceKind::Sparse,
            RetrievalMode::Unindexed => SourceKind::Insertion,
        }
    }

    pub fn to_state(&self) -> RepresentationState {
        match self {
            RetrievalMode::Dense(d) => RepresentationState::Dense {
                embedder_id: d.embedder_id.clone(),
                vectors: d.vectors.clone(),
            },
            RetrievalMode::Sparse(s) => RepresentationState::Sparse { index: s.clone() },
            RetrievalMode::Unindexed => RepresentationState::Unindexed,
        }
    }
}

/// Serializable form of [`RetrievalMode`], stored in snapshots. The
/// accelerated search structure is derived state and rebuilt on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RepresentationState {
    Dense { embedder_id: String, vectors: DenseMatrix },
    Sparse { index: SparseIndex },
    Unindexed,
}

impl RepresentationState {
    pub fn rows(&self) -> Option<usize> {
        match self {
            RepresentationState::Dense { vectors, .. } => Some(vectors.len()),
            RepresentationState::Sparse { index } => Some(index.len()),
            RepresentationState::Unindexed => None,
        }
    }
}

/// `Empty → ChunksLoaded → Indexed → ChunksLoaded → …`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Empty,
    ChunksLoaded,
    Indexed,
}
