//! Dense path of the retrieval index.
//!
//! Embedding rows are validated and L2-normalised (`normalize`), optionally
//! loaded into an exact inner-product structure (`flat`), and scored by
//! brute force otherwise (`search`). `cache` keeps vectors by content hash so
//! a rebuild only embeds chunks it has not seen.

pub mod cache;
pub mod flat;
pub mod normalize;
pub mod search;

pub use cache::EmbeddingCache;
pub use flat::FlatIpIndex;
pub use normalize::{l2_normalize, validate_embeddings};
pub use search::{brute_force_search, DenseMatrix};
