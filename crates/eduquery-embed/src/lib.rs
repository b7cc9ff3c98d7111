//! Dense embedding providers for the retrieval index.
//!
//! `BgeM3Embedder` runs a local XLM-RoBERTa checkpoint through candle;
//! `FakeEmbedder` hashes tokens into a fixed-size vector and is used in
//! tests and offline development. `get_default_embedder` chooses between
//! them, and its failure is what sends the index down the sparse path.

use anyhow::{Result, anyhow, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use eduquery_core::config::EmbedderSettings;
use eduquery_core::traits::Embedder;

pub mod bge;
pub mod pool;

pub use bge::BgeM3Embedder;
pub use pool::masked_mean_l2;

/// Deterministic bag-of-words embedder: every lowercased alphanumeric token
/// is hashed into one bucket with a hash-derived weight in `[0.5, 1.0]`.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder { pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } } }

impl FakeEmbedder {
    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32) * 0.5;
            v[idx] += val;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; } v
    }
}

impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> String { format!("fake:xxh64:d{}", self.dim) }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Acquire the configured dense embedder. An error here means "dense
/// capability unavailable".
pub fn get_default_embedder(settings: &EmbedderSettings) -> Result<Box<dyn Embedder>> {
    if !settings.enabled { bail!("dense embeddings disabled by configuration"); }
    if settings.use_fake || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    match BgeM3Embedder::from_dir(&model_dir, settings.max_len) {
        Ok(embedder) => Ok(Box::new(embedder)),
        Err(e) => { warn!(error = %e, dir = %model_dir.display(), "failed to load BGE-M3 model"); Err(e) }
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = eduquery_core::config::expand_path(dir); if p.exists() { return Ok(p); } warn!(dir = %p.display(), "configured model_dir does not exist"); }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { debug!("using APP_MODEL_DIR: {}", p.display()); return Ok(p); } }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { debug!("using MODEL_DIR: {}", p.display()); return Ok(p); } }
    let local = Path::new("models/bge-m3"); if local.exists() { return Ok(local.to_path_buf()); }
    Err(anyhow!("Could not locate BGE-M3 model directory"))
}
