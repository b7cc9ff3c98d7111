/// Dense embedding capability: maps a batch of strings to one
/// fixed-length vector per string.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model; vectors from different
    /// ids are never mixed.
    fn embedder_id(&self) -> String {
        format!("{}:d{}", std::any::type_name::<Self>(), self.dim())
    }
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Accelerated exact inner-product search over unit vectors.
///
/// Implementations must rank with [`crate::ranking::top_k`] semantics so
/// results agree with the brute-force path, ties included.
pub trait VectorSearch: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn add(&mut self, vectors: &[Vec<f32>]) -> anyhow::Result<()>;
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<(usize, f32)>>;
}
