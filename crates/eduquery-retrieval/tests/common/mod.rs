#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use eduquery_core::config::RetrievalSettings;
use eduquery_core::traits::Embedder;
use eduquery_embed::FakeEmbedder;
use eduquery_retrieval::{Capabilities, RetrievalIndex};

pub fn biology() -> Vec<&'static str> {
    vec![
        "Photosynthesis converts light to energy.",
        "Mitosis is cell division.",
        "Plants use chlorophyll.",
    ]
}

pub const CHLOROPHYLL_QUERY: &str = "What pigment captures light in plants?";

/// Hand-made concept space: each listed word lights up one dimension,
/// synonyms share a dimension.
pub struct KeywordEmbedder;

const CONCEPTS: &[&[&str]] = &[
    &["light", "sunlight"],
    &["plants", "plant", "leaf"],
    &["chlorophyll", "pigment", "green"],
    &["energy", "atp"],
    &["photosynthesis"],
    &["mitosis", "division", "cell"],
];

impl KeywordEmbedder {
    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; CONCEPTS.len()];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if let Some(dim) = CONCEPTS.iter().position(|words| words.contains(&token)) {
                v[dim] += 1.0;
            }
        }
        v
    }
}

impl Embedder for KeywordEmbedder {
    fn embedder_id(&self) -> String { "test:keyword".to_string() }
    fn dim(&self) -> usize { CONCEPTS.len() }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Works for indexing, fails for any text containing `poison`.
pub struct PoisonEmbedder(pub FakeEmbedder);

impl Embedder for PoisonEmbedder {
    fn embedder_id(&self) -> String { "test:poison".to_string() }
    fn dim(&self) -> usize { self.0.dim() }
    fn max_len(&self) -> usize { self.0.max_len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("poison")) {
            bail!("embedding service unavailable");
        }
        self.0.embed_batch(texts)
    }
}

/// Counts how many texts were sent for embedding.
pub struct CountingEmbedder {
    pub inner: FakeEmbedder,
    pub embedded: Arc<AtomicUsize>,
}

impl Embedder for CountingEmbedder {
    fn embedder_id(&self) -> String { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

pub fn fake_capabilities() -> Capabilities {
    Capabilities::none()
        .with_embedder(|| Ok(Box::new(FakeEmbedder::new(128)) as Box<dyn Embedder>))
        .with_flat_search()
}

pub fn keyword_capabilities() -> Capabilities {
    Capabilities::none().with_embedder(|| Ok(Box::new(KeywordEmbedder) as Box<dyn Embedder>))
}

pub fn unavailable_capabilities() -> Capabilities {
    Capabilities::none().with_embedder(|| bail!("sentence model not installed"))
}

pub fn dense_index() -> RetrievalIndex {
    RetrievalIndex::new(RetrievalSettings::default(), fake_capabilities())
}

pub fn sparse_index() -> RetrievalIndex {
    RetrievalIndex::new(RetrievalSettings::default(), Capabilities::none())
}

pub fn corpus() -> Vec<String> {
    vec![
        "Algebra deals with symbols and the rules for manipulating them.".to_string(),
        "Quadratic equations are polynomial equations of degree two.".to_string(),
        "The Pythagorean theorem relates the sides of a right triangle.".to_string(),
        "Chlorophyll is the green pigment in chloroplasts that captures light.".to_string(),
        "Mitochondria produce ATP through cellular respiration.".to_string(),
        "Newton's second law states that force equals mass times acceleration.".to_string(),
        "Python uses indentation to define code blocks.".to_string(),
        "Eukaryotic cells have a nucleus containing DNA.".to_string(),
    ]
}
