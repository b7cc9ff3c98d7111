use anyhow::Result;

use eduquery_core::config::RetrievalSettings;
use eduquery_core::traits::{Embedder, VectorSearch};
use eduquery_embed::get_default_embedder;
use eduquery_vector::FlatIpIndex;

pub type EmbedderFactory = Box<dyn Fn() -> Result<Box<dyn Embedder>> + Send + Sync>;
pub type VectorSearchFactory = Box<dyn Fn(usize) -> Result<Box<dyn VectorSearch>> + Send + Sync>;

/// Optional collaborators the index probes when it builds. A missing
/// factory, or one that returns an error, means the capability is
/// unavailable.
#[derive(Default)]
pub struct Capabilities {
    pub embedder: Option<EmbedderFactory>,
    pub vector_search: Option<VectorSearchFactory>,
}

impl Capabilities {
    /// Sparse-only: no embedder, no accelerated search.
    pub fn none() -> Self {
        Self::default()
    }

    /// The configured embedder from `eduquery-embed` plus the flat
    /// inner-product index.
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        let embedder_settings = settings.embedder.clone();
        Self::none()
            .with_embedder(move || get_default_embedder(&embedder_settings))
            .with_flat_search()
    }

    pub fn with_embedder<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Embedder>> + Send + Sync + 'static,
    {
        self.embedder = Some(Box::new(factory));
        self
    }

    pub fn with_vector_search<F>(mut self, factory: F) -> Self
    where
        F: Fn(usize) -> Result<Box<dyn VectorSearch>> + Send + Sync + 'static,
    {
        self.vector_search = Some(Box::new(factory));
        self
    }

    pub fn with_flat_search(self) -> Self {
        self.with_vector_search(|dim| Ok(Box::new(FlatIpIndex::new(dim)) as Box<dyn VectorSearch>))
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("embedder", &self.embedder.is_some())
            .field("vector_search", &self.vector_search.is_some())
            .finish()
    }
}
