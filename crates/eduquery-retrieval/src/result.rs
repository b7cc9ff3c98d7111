use serde::Serialize;
use serde_json::{Map, Value};

use eduquery_core::types::{Chunk, ChunkId, Meta, SourceKind};

/// Keys of a flattened record that metadata can never override.
pub const RESERVED_KEYS: [&str; 4] = ["chunk_id", "score", "text_snippet", "text"];

pub const TRUNCATION_MARKER: &str = "...";

/// First `max_chars` characters of `text`, with [`TRUNCATION_MARKER`]
/// appended when anything was cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}{}", &text[..byte], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk_id: ChunkId,
    pub score: f32,
    pub text_snippet: String,
    pub text: String,
    pub metadata: Meta,
}

impl RetrievedChunk {
    pub fn new(chunk_id: ChunkId, score: f32, chunk: &Chunk, snippet_chars: usize) -> Self {
        Self {
            chunk_id,
            score,
            text_snippet: snippet(&chunk.text, snippet_chars),
            text: chunk.text.clone(),
            metadata: chunk.metadata.clone(),
        }
    }

    /// One flat JSON object: metadata keys first, then the reserved fields,
    /// which win on collision. Colliding metadata values stay available in
    /// [`RetrievedChunk::metadata`].
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record: Map<String, Value> = self
            .metadata
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        record.insert("chunk_id".into(), Value::from(self.chunk_id));
        record.insert("score".into(), Value::from(f64::from(self.score)));
        record.insert("text_snippet".into(), Value::String(self.text_snippet.clone()));
        record.insert("text".into(), Value::String(self.text.clone()));
        record
    }
}

/// Result of one `retrieve` call.
///
/// `source` names the path that actually scored the chunks.
/// `used_fallback` is set whenever that path is not dense similarity; it is
/// false for an empty index, where nothing was scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retrieval {
    pub hits: Vec<RetrievedChunk>,
    pub source: SourceKind,
    pub used_fallback: bool,
}

impl Retrieval {
    pub fn empty() -> Self {
        Self { hits: Vec::new(), source: SourceKind::Insertion, used_fallback: false }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        self.hits.iter().map(|h| h.chunk_id).collect()
    }

    /// Passage texts joined by blank lines, ready to drop into a prompt.
    pub fn context(&self) -> String {
        self.hits.iter().map(|h| h.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }
}
