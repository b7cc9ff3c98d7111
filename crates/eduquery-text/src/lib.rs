//! eduquery-text
//!
//! Sparse lexical path of the retrieval index: a tantivy analyzer feeding a
//! TF-IDF vectorizer, and linear-kernel scoring over the fitted term matrix.

pub mod analyzer;
pub mod matrix;
pub mod search;
pub mod vectorizer;

pub use matrix::{SparseMatrix, SparseVec};
pub use search::SparseIndex;
pub use vectorizer::{TfidfVectorizer, VectorizerOptions};
