//! TF-IDF vectorizer over a vocabulary learned from the chunk collection.
//!
//! Weights are raw term counts times a smoothed inverse document frequency,
//! `ln((1 + n) / (1 + df)) + 1`, and every row is L2-normalised so the
//! linear kernel equals cosine similarity.

use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, ensure, Result};
use serde::{Deserialize, Serialize};
use tantivy::tokenizer::TextAnalyzer;

use crate::analyzer::{build_analyzer, tokenize};
use crate::matrix::{SparseMatrix, SparseVec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerOptions {
    pub max_features: usize,
    pub stop_words: bool,
}

impl Default for VectorizerOptions {
    fn default() -> Self {
        Self { max_features: 20_000, stop_words: true }
    }
}

/// Fitted vectorizer state. Everything needed to map a future query into
/// the same term space; the analyzer is rebuilt from `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    options: VectorizerOptions,
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
}

fn term_counts(analyzer: &mut TextAnalyzer, text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokenize(analyzer, text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF weights from `texts`.
    ///
    /// Fails when no text yields a single usable term.
    pub fn fit<S: AsRef<str>>(options: VectorizerOptions, texts: &[S]) -> Result<Self> {
        Self::fit_transform(options, texts).map(|(v, _)| v)
    }

    /// Fit and return the weighted document-term matrix in one pass.
    pub fn fit_transform<S: AsRef<str>>(options: VectorizerOptions, texts: &[S]) -> Result<(Self, SparseMatrix)> {
        if options.max_features == 0 {
            return Err(anyhow!("max_features must be positive"));
        }
        let mut analyzer = build_analyzer(options.stop_words);
        let docs: Vec<HashMap<String, u32>> = texts.iter().map(|t| term_counts(&mut analyzer, t.as_ref())).collect();

        let mut corpus_freq: HashMap<&str, u64> = HashMap::new();
        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        for doc in &docs {
            for (term, count) in doc {
                *corpus_freq.entry(term.as_str()).or_insert(0) += u64::from(*count);
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        if corpus_freq.is_empty() {
            return Err(anyhow!("empty vocabulary; documents contain no indexable terms"));
        }

        let mut terms: Vec<&str> = corpus_freq.keys().copied().collect();
        if terms.len() > options.max_features {
            terms.sort_by(|a, b| corpus_freq[b].cmp(&corpus_freq[a]).then_with(|| a.cmp(b)));
            terms.truncate(options.max_features);
        }
        terms.sort_unstable();

        let n = texts.len() as f32;
        let idf: Vec<f32> = terms.iter().map(|t| ((1.0 + n) / (1.0 + doc_freq[t] as f32)).ln() + 1.0).collect();
        let vocabulary: BTreeMap<String, u32> = terms.iter().enumerate().map(|(i, t)| ((*t).to_string(), i as u32)).collect();

        let vectorizer = Self { options, vocabulary, idf };
        let rows = docs.iter().map(|counts| vectorizer.weigh(counts)).collect();
        let matrix = SparseMatrix { n_features: vectorizer.n_features(), rows };
        Ok((vectorizer, matrix))
    }

    /// Map `text` into the fitted term space. Unknown terms are ignored, so
    /// a text with none of the vocabulary yields the zero vector.
    pub fn transform(&self, text: &str) -> SparseVec {
        let mut analyzer = build_analyzer(self.options.stop_words);
        self.weigh(&term_counts(&mut analyzer, text))
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVec {
        let pairs = counts
            .iter()
            .filter_map(|(term, count)| {
                let i = *self.vocabulary.get(term)?;
                self.idf.get(i as usize).map(|w| (i, *count as f32 * w))
            })
            .collect();
        let mut row = SparseVec::from_pairs(pairs);
        row.l2_normalize();
        row
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn options(&self) -> VectorizerOptions {
        self.options
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, u32> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).and_then(|&i| self.idf.get(i as usize).copied())
    }

    /// Check state restored from outside `fit`: one IDF weight per term,
    /// every term index distinct and in range, all weights finite.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.vocabulary.len() == self.idf.len(), "vocabulary has {} terms but {} idf weights", self.vocabulary.len(), self.idf.len());
        let mut seen = vec![false; self.idf.len()];
        for (term, &i) in &self.vocabulary {
            let slot = seen.get_mut(i as usize).ok_or_else(|| anyhow!("term '{}' maps to index {} beyond {} features", term, i, self.idf.len()))?;
            ensure!(!*slot, "term index {} is used twice", i);
            *slot = true;
        }
        ensure!(self.idf.iter().all(|w| w.is_finite()), "idf weights must be finite");
        Ok(())
    }
}
