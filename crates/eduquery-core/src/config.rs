//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys come from `__` in variable names, so
//! `APP_RETRIEVAL__SNIPPET_CHARS=200` sets `retrieval.snippet_chars`.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_in(Path::new("."))
    }

    /// Load the layered config files found in `base`.
    pub fn load_in(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base: base.to_path_buf() };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Retrieval settings from the `retrieval` table, defaults when absent.
    /// A relative `snapshot_path` is resolved against the config directory.
    pub fn retrieval(&self) -> anyhow::Result<RetrievalSettings> {
        let mut settings = if self.figment.find_value("retrieval").is_ok() {
            self.get::<RetrievalSettings>("retrieval")?
        } else {
            RetrievalSettings::default()
        };
        if let Some(p) = settings.snapshot_path.take() {
            settings.snapshot_path = Some(resolve_with_base(&self.base, p.to_string_lossy()));
        }
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                if self.figment.find_value("retrieval.embedder.use_fake").ok().and_then(|v| v.to_bool()) == Some(true) {
                    anyhow::bail!("retrieval.embedder.use_fake must not be enabled in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Knobs of a `RetrievalIndex`. Every field has a default, so a partial
/// `[retrieval]` table is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Where the index snapshot is read at startup and written on save.
    pub snapshot_path: Option<PathBuf>,
    /// Characters kept in `text_snippet` before the `...` marker.
    pub snippet_chars: usize,
    pub default_top_k: usize,
    /// Vocabulary cap for the sparse path.
    pub max_features: usize,
    pub stop_words: bool,
    /// Build a flat inner-product index for dense mode instead of scanning.
    pub use_vector_index: bool,
    pub embedder: EmbedderSettings,
    pub chunking: ChunkingSettings,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            snippet_chars: 400,
            default_top_k: 3,
            max_features: 20_000,
            stop_words: true,
            use_vector_index: true,
            embedder: EmbedderSettings::default(),
            chunking: ChunkingSettings::default(),
        }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(Error::InvalidConfig("max_features must be positive".into()));
        }
        if self.default_top_k == 0 {
            return Err(Error::InvalidConfig("default_top_k must be positive".into()));
        }
        if self.embedder.max_len == 0 {
            return Err(Error::InvalidConfig("embedder.max_len must be positive".into()));
        }
        self.chunking.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderSettings {
    /// When false the dense path is never attempted.
    pub enabled: bool,
    pub use_fake: bool,
    pub fake_dim: usize,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self { enabled: true, use_fake: false, fake_dim: 384, model_dir: None, max_len: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 50 }
    }
}

impl ChunkingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
