use std::collections::HashMap;

use tracing::debug;

/// Normalised embeddings keyed by blake3 content hash, valid for one
/// embedder id. Switching embedder clears the cache.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingCache {
    embedder_id: Option<String>,
    vectors: HashMap<String, Vec<f32>>,
}

pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache to `embedder_id`, dropping vectors from any other one.
    pub fn bind(&mut self, embedder_id: &str) {
        if self.embedder_id.as_deref() != Some(embedder_id) {
            if !self.vectors.is_empty() {
                debug!(old = ?self.embedder_id, new = embedder_id, "embedder changed, clearing cache");
            }
            self.vectors.clear();
            self.embedder_id = Some(embedder_id.to_string());
        }
    }

    pub fn embedder_id(&self) -> Option<&str> {
        self.embedder_id.as_deref()
    }

    pub fn get(&self, text: &str) -> Option<&Vec<f32>> {
        self.vectors.get(&content_hash(text))
    }

    pub fn insert(&mut self, text: &str, vector: Vec<f32>) {
        self.vectors.insert(content_hash(text), vector);
    }

    /// Texts (deduplicated, first occurrence order) with no cached vector.
    pub fn missing<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let mut seen = std::collections::HashSet::new();
        texts
            .into_iter()
            .filter(|t| !self.vectors.contains_key(&content_hash(t)))
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Drop every vector whose text is not in `texts`.
    pub fn retain<'a>(&mut self, texts: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<String> = texts.into_iter().map(content_hash).collect();
        let before = self.vectors.len();
        self.vectors.retain(|hash, _| keep.contains(hash));
        if self.vectors.len() < before {
            debug!(dropped = before - self.vectors.len(), kept = self.vectors.len(), "pruned embedding cache");
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
    }
}
