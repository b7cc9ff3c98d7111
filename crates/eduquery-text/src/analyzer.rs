use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Tokens shorter than this (in characters) never enter the vocabulary.
pub const MIN_TOKEN_CHARS: usize = 2;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from",
    "has", "he", "in", "is", "it", "its", "of", "on", "that", "the", "to", "was",
    "will", "with", "or", "but", "not", "this", "these", "they", "them", "their",
    "there", "then", "than", "so", "if", "when", "where", "why", "how", "what",
    "which", "who", "whom", "whose", "can", "could", "should", "would", "may",
    "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

pub fn build_analyzer(stop_words: bool) -> TextAnalyzer {
    let words: Vec<String> = if stop_words {
        STOP_WORDS.iter().map(|s| s.to_string()).collect()
    } else {
        Vec::new()
    };
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(words))
        .build()
}

/// Run `text` through the analyzer, keeping tokens of at least
/// [`MIN_TOKEN_CHARS`] characters.
pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut stream = analyzer.token_stream(text);
    while stream.advance() {
        let token = &stream.token().text;
        if token.chars().count() >= MIN_TOKEN_CHARS {
            tokens.push(token.clone());
        }
    }
    tokens
}
