//! In-process retrieval index with dense → sparse → insertion-order
//! fallback. See [`RetrievalIndex`].

pub mod batch;
pub mod capabilities;
pub mod index;
pub mod mode;
pub mod result;
pub mod snapshot;

pub use batch::DocumentBatch;
pub use capabilities::Capabilities;
pub use index::RetrievalIndex;
pub use mode::{DenseState, IndexState, RepresentationState, RetrievalMode};
pub use result::{Retrieval, RetrievedChunk};
