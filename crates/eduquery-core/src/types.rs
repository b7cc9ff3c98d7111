//! Domain types shared by the sparse and dense retrieval paths.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position of a chunk in the index's ordered collection.
pub type ChunkId = usize;
pub type Meta = HashMap<String, String>;

/// A unit of retrievable text with attached metadata.
///
/// Chunks are append-only; a chunk's identity is its position in the
/// collection, so the struct itself carries no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: Meta::new() }
    }

    pub fn with_metadata(text: impl Into<String>, metadata: Meta) -> Self {
        Self { text: text.into(), metadata }
    }
}

/// Which similarity path produced a result.
///
/// `Insertion` is the last resort: no similarity was computed and chunks
/// come back in the order they were added.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Dense,
    Sparse,
    Insertion,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Dense => "dense",
            SourceKind::Sparse => "sparse",
            SourceKind::Insertion => "insertion",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The minimal surface returned by both similarity paths.
///
/// `index` points into the chunk collection. `score` is higher-is-better
/// (inner product for dense, linear kernel for sparse).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}
