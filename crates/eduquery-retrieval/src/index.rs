use std::path::Path;

use anyhow::{anyhow, bail, Result as AnyResult};
use tracing::{debug, info, warn};

use eduquery_core::config::RetrievalSettings;
use eduquery_core::error::{Error, Result};
use eduquery_core::traits::{Embedder, VectorSearch};
use eduquery_core::types::{Chunk, SearchHit, SourceKind};
use eduquery_text::{SparseIndex, VectorizerOptions};
use eduquery_vector::{brute_force_search, l2_normalize, validate_embeddings, DenseMatrix, EmbeddingCache};

use crate::batch::DocumentBatch;
use crate::capabilities::Capabilities;
use crate::mode::{DenseState, IndexState, RepresentationState, RetrievalMode};
use crate::result::{Retrieval, RetrievedChunk};
use crate::snapshot::{read_snapshot, write_snapshot, Snapshot};

/// Append-only chunk collection with a lazily built similarity
/// representation.
///
/// The representation is built on the first query (or by `build_index`)
/// and dropped by every append. Building prefers dense embeddings, then
/// TF-IDF, then nothing; queries never fail and report which path answered
/// through [`Retrieval::source`] and [`Retrieval::used_fallback`].
pub struct RetrievalIndex {
    settings: RetrievalSettings,
    capabilities: Capabilities,
    chunks: Vec<Chunk>,
    embedder: Option<Box<dyn Embedder>>,
    cache: EmbeddingCache,
    representation: Option<RetrievalMode>,
    /// Set when acquiring the embedder failed; cleared by any invalidation.
    embedder_unavailable: bool,
    /// Sparse (or unindexed) answer for queries the dense representation
    /// could not serve, fitted once per chunk collection.
    query_fallback: Option<RetrievalMode>,
}

impl RetrievalIndex {
    /// An empty index. Nothing is read from `settings.snapshot_path`.
    pub fn new(settings: RetrievalSettings, capabilities: Capabilities) -> Self {
        Self {
            settings,
            capabilities,
            chunks: Vec::new(),
            embedder: None,
            cache: EmbeddingCache::new(),
            representation: None,
            embedder_unavailable: false,
            query_fallback: None,
        }
    }

    /// Restore from `settings.snapshot_path` when it exists. A snapshot that
    /// cannot be read is logged and the index starts empty.
    pub fn open(settings: RetrievalSettings, capabilities: Capabilities) -> Self {
        let mut index = Self::new(settings, capabilities);
        if let Some(path) = index.settings.snapshot_path.clone() {
            if path.exists() {
                if let Err(e) = index.load_from(&path) {
                    warn!(path = %path.display(), error = %e, "could not load snapshot, starting empty");
                    index.clear();
                }
            } else {
                debug!(path = %path.display(), "no snapshot yet, starting empty");
            }
        }
        index
    }

    /// [`RetrievalIndex::open`] with the embedder and flat search chosen by
    /// `settings`.
    pub fn with_default_capabilities(settings: RetrievalSettings) -> Self {
        let capabilities = Capabilities::from_settings(&settings);
        Self::open(settings, capabilities)
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// True when a dense or sparse representation is current.
    pub fn has_index(&self) -> bool {
        matches!(self.representation, Some(RetrievalMode::Dense(_)) | Some(RetrievalMode::Sparse(_)))
    }

    /// The current representation, `None` while a rebuild is pending.
    pub fn mode(&self) -> Option<&RetrievalMode> {
        self.representation.as_ref()
    }

    pub fn representation_state(&self) -> Option<RepresentationState> {
        self.representation.as_ref().map(RetrievalMode::to_state)
    }

    pub fn state(&self) -> IndexState {
        if self.chunks.is_empty() {
            IndexState::Empty
        } else if self.representation.is_some() {
            IndexState::Indexed
        } else {
            IndexState::ChunksLoaded
        }
    }

    /// Every chunk's text joined by blank lines.
    pub fn all_text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }

    /// Append a batch and invalidate the representation. Returns the number
    /// of chunks appended.
    pub fn add_documents(&mut self, batch: impl Into<DocumentBatch>) -> usize {
        let new_chunks = batch.into().into_chunks();
        let added = new_chunks.len();
        self.chunks.extend(new_chunks);
        self.invalidate();
        debug!(added, total = self.chunks.len(), "chunks appended, representation invalidated");
        added
    }

    /// Replace the whole collection.
    pub fn reset(&mut self, batch: impl Into<DocumentBatch>) -> usize {
        self.clear();
        self.add_documents(batch)
    }

    fn clear(&mut self) {
        self.chunks.clear();
        self.cache.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.representation = None;
        self.query_fallback = None;
        self.embedder_unavailable = false;
    }

    /// Number of embeddings held for reuse across rebuilds.
    pub fn cached_vectors(&self) -> usize {
        self.cache.len()
    }

    /// Build the representation if it is missing. A no-op on an empty index
    /// or when nothing changed since the last build. Returns the mode now in
    /// effect.
    pub fn build_index(&mut self) -> Option<SourceKind> {
        if self.chunks.is_empty() {
            return None;
        }
        if let Some(mode) = &self.representation {
            return Some(mode.source());
        }
        let mode = self.build();
        let source = mode.source();
        info!(chunks = self.chunks.len(), mode = %source, "index built");
        self.representation = Some(mode);
        Some(source)
    }

    /// Drop the current representation and build it again.
    pub fn rebuild_index(&mut self) -> Option<SourceKind> {
        self.invalidate();
        self.build_index()
    }

    fn build(&mut self) -> RetrievalMode {
        match self.build_dense() {
            Ok(state) => return RetrievalMode::Dense(state),
            Err(e) => {
                if self.capabilities.embedder.is_some() {
                    warn!(error = %e, "dense build failed, falling back to tf-idf");
                } else {
                    debug!("no embedding capability, using tf-idf");
                }
                self.embedder = None;
            }
        }
        match self.fit_sparse() {
            Ok(index) => RetrievalMode::Sparse(index),
            Err(e) => {
                warn!(error = %e, "tf-idf build failed, queries will return earliest chunks");
                RetrievalMode::Unindexed
            }
        }
    }

    fn ensure_embedder(&mut self) -> AnyResult<()> {
        if self.embedder.is_some() {
            return Ok(());
        }
        if self.embedder_unavailable {
            bail!("embedding capability unavailable until the next rebuild");
        }
        let acquired = match self.capabilities.embedder.as_ref() {
            Some(factory) => factory(),
            None => Err(anyhow!("no embedding capability configured")),
        };
        match acquired {
            Ok(embedder) => {
                debug!(embedder = %embedder.embedder_id(), "embedding capability acquired");
                self.embedder = Some(embedder);
                Ok(())
            }
            Err(e) => {
                self.embedder_unavailable = true;
                Err(e)
            }
        }
    }

    fn build_dense(&mut self) -> AnyResult<DenseState> {
        self.ensure_embedder()?;
        let embedder = self.embedder.as_deref().ok_or_else(|| anyhow!("embedder missing after acquisition"))?;
        let texts: Vec<&str> = self.chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embed_with_cache(embedder, &mut self.cache, &texts)?;
        self.cache.retain(texts.iter().copied());
        let embedder_id = embedder.embedder_id();
        let search = self.accelerated_search(&vectors);
        Ok(DenseState { embedder_id, vectors, search })
    }

    fn accelerated_search(&self, vectors: &DenseMatrix) -> Option<Box<dyn VectorSearch>> {
        if !self.settings.use_vector_index {
            return None;
        }
        let factory = self.capabilities.vector_search.as_ref()?;
        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        let built = factory(dim).and_then(|mut search| {
            search.add(vectors)?;
            Ok(search)
        });
        match built {
            Ok(search) => Some(search),
            Err(e) => {
                warn!(error = %e, "vector search unavailable, using brute-force inner product");
                None
            }
        }
    }

    fn vectorizer_options(&self) -> VectorizerOptions {
        VectorizerOptions { max_features: self.settings.max_features, stop_words: self.settings.stop_words }
    }

    fn fit_sparse(&self) -> AnyResult<SparseIndex> {
        let texts: Vec<&str> = self.chunks.iter().map(|c| c.text.as_str()).collect();
        SparseIndex::fit(self.vectorizer_options(), &texts)
    }

    /// Top `top_k` chunks for `query`, best first. Builds the representation
    /// first if an append invalidated it. Never fails: when every similarity
    /// path errors the earliest chunks come back with score 0.
    pub fn retrieve(&mut self, query: &str, top_k: usize) -> Retrieval {
        if self.chunks.is_empty() {
            return Retrieval::empty();
        }
        self.build_index();
        let k = top_k.min(self.chunks.len());
        let (hits, source) = self.search(query, k);
        let snippet_chars = self.settings.snippet_chars;
        let hits = hits
            .into_iter()
            .filter_map(|hit| {
                self.chunks.get(hit.index).map(|chunk| RetrievedChunk::new(hit.index, hit.score, chunk, snippet_chars))
            })
            .collect();
        Retrieval { hits, source, used_fallback: source != SourceKind::Dense }
    }

    /// [`RetrievalIndex::retrieve`] with `settings.default_top_k`.
    pub fn retrieve_default(&mut self, query: &str) -> Retrieval {
        let k = self.settings.default_top_k;
        self.retrieve(query, k)
    }

    fn search(&mut self, query: &str, k: usize) -> (Vec<SearchHit>, SourceKind) {
        match self.representation.as_ref().map(RetrievalMode::source) {
            Some(SourceKind::Dense) => match self.query_dense(query, k) {
                Ok(hits) => (hits, SourceKind::Dense),
                Err(e) => {
                    warn!(error = %e, "dense query failed, answering with a transient tf-idf fit");
                    self.transient_sparse(query, k)
                }
            },
            Some(SourceKind::Sparse) => match &self.representation {
                Some(RetrievalMode::Sparse(index)) => (index.search(query, k), SourceKind::Sparse),
                _ => (self.insertion_order(k), SourceKind::Insertion),
            },
            _ => (self.insertion_order(k), SourceKind::Insertion),
        }
    }

    fn query_dense(&mut self, query: &str, k: usize) -> AnyResult<Vec<SearchHit>> {
        self.ensure_embedder()?;
        let embedder = self.embedder.as_deref().ok_or_else(|| anyhow!("embedder missing after acquisition"))?;
        let Some(RetrievalMode::Dense(state)) = &self.representation else {
            bail!("dense representation missing");
        };
        let id = embedder.embedder_id();
        if id != state.embedder_id {
            bail!("embedder {} cannot query vectors built by {}", id, state.embedder_id);
        }
        let mut q = embedder
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        validate_embeddings(std::slice::from_ref(&q), 1)?;
        if q.len() != state.dim() {
            bail!("query has dim {}, index has dim {}", q.len(), state.dim());
        }
        l2_normalize(&mut q);
        match &state.search {
            Some(search) => Ok(search
                .search(&q, k)?
                .into_iter()
                .map(|(index, score)| SearchHit { index, score, source: SourceKind::Dense })
                .collect()),
            None => Ok(brute_force_search(&state.vectors, &q, k)),
        }
    }

    fn transient_sparse(&mut self, query: &str, k: usize) -> (Vec<SearchHit>, SourceKind) {
        let fallback = match self.query_fallback.take() {
            Some(mode) => mode,
            None => match self.fit_sparse() {
                Ok(index) => RetrievalMode::Sparse(index),
                Err(e) => {
                    warn!(error = %e, "tf-idf fallback failed, returning earliest chunks");
                    RetrievalMode::Unindexed
                }
            },
        };
        let answer = match &fallback {
            RetrievalMode::Sparse(index) => (index.search(query, k), SourceKind::Sparse),
            _ => (self.insertion_order(k), SourceKind::Insertion),
        };
        self.query_fallback = Some(fallback);
        answer
    }

    fn insertion_order(&self, k: usize) -> Vec<SearchHit> {
        (0..k.min(self.chunks.len()))
            .map(|index| SearchHit { index, score: 0.0, source: SourceKind::Insertion })
            .collect()
    }

    /// Write a snapshot to `settings.snapshot_path`.
    pub fn save(&self) -> Result<()> {
        let path = self
            .settings
            .snapshot_path
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("snapshot_path is not set".into()))?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot::new(self.chunks.clone(), self.representation_state());
        write_snapshot(path, &snapshot)?;
        info!(path = %path.display(), chunks = self.chunks.len(), "index saved");
        Ok(())
    }

    /// Replace chunks and representation with the snapshot at `path`. The
    /// stored representation is restored in its own mode; one whose row
    /// count disagrees with the chunks is dropped and rebuilt lazily.
    pub fn load_from(&mut self, path: &Path) -> Result<()> {
        let snapshot = read_snapshot(path)?;
        self.chunks = snapshot.chunks;
        self.cache.clear();
        self.invalidate();
        match snapshot.representation {
            Some(state) if state.rows() == Some(self.chunks.len()) => {
                if let Err(e) = self.restore(state) {
                    warn!(error = %e, "snapshot representation is inconsistent, will rebuild");
                }
            }
            Some(state) if state.rows().is_some() => {
                warn!(rows = ?state.rows(), chunks = self.chunks.len(), "snapshot representation misaligned, will rebuild");
            }
            _ => {}
        }
        info!(path = %path.display(), chunks = self.chunks.len(), indexed = self.has_index(), "index loaded");
        Ok(())
    }

    /// Install a stored representation after checking it is internally
    /// consistent. On error nothing is installed.
    fn restore(&mut self, state: RepresentationState) -> AnyResult<()> {
        match state {
            RepresentationState::Sparse { index } => {
                index.validate()?;
                self.representation = Some(RetrievalMode::Sparse(index));
            }
            RepresentationState::Dense { embedder_id, vectors } => {
                validate_embeddings(&vectors, self.chunks.len())?;
                self.cache.bind(&embedder_id);
                for (chunk, v) in self.chunks.iter().zip(&vectors) {
                    self.cache.insert(&chunk.text, v.clone());
                }
                let search = self.accelerated_search(&vectors);
                self.representation = Some(RetrievalMode::Dense(DenseState { embedder_id, vectors, search }));
            }
            RepresentationState::Unindexed => {}
        }
        Ok(())
    }
}

/// Vectors for `texts`, embedding only those the cache has not seen.
/// Fresh vectors are validated and normalised before they are cached.
fn embed_with_cache(embedder: &dyn Embedder, cache: &mut EmbeddingCache, texts: &[&str]) -> AnyResult<DenseMatrix> {
    cache.bind(&embedder.embedder_id());
    let missing: Vec<String> = cache.missing(texts.iter().copied()).into_iter().map(str::to_string).collect();
    if !missing.is_empty() {
        debug!(fresh = missing.len(), cached = texts.len() - missing.len(), "embedding chunks");
        let fresh = embedder.embed_batch(&missing)?;
        validate_embeddings(&fresh, missing.len())?;
        for (text, mut v) in missing.iter().zip(fresh) {
            l2_normalize(&mut v);
            cache.insert(text, v);
        }
    }
    let vectors = texts
        .iter()
        .map(|t| cache.get(t).cloned().ok_or_else(|| anyhow!("no cached vector for chunk")))
        .collect::<AnyResult<DenseMatrix>>()?;
    validate_embeddings(&vectors, texts.len())?;
    Ok(vectors)
}
