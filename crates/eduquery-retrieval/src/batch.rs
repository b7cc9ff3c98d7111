use serde_json::Value;

use eduquery_core::types::{Chunk, Meta};

/// Everything `RetrievalIndex::add_documents` accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBatch {
    Single(String),
    Texts(Vec<String>),
    Pairs(Vec<(String, Meta)>),
}

impl DocumentBatch {
    pub fn into_chunks(self) -> Vec<Chunk> {
        match self {
            DocumentBatch::Single(text) => vec![Chunk::new(text)],
            DocumentBatch::Texts(texts) => texts.into_iter().map(Chunk::new).collect(),
            DocumentBatch::Pairs(pairs) => pairs.into_iter().map(|(t, m)| Chunk::with_metadata(t, m)).collect(),
        }
    }

    /// Coerce arbitrary JSON into a batch. Items may be strings,
    /// `[text, {metadata}]` pairs or `{"text": .., "metadata": {..}}`
    /// objects; anything else becomes its JSON text with empty metadata.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => DocumentBatch::Single(s),
            Value::Array(items) => DocumentBatch::Pairs(items.into_iter().map(coerce_item).collect()),
            other => DocumentBatch::Pairs(vec![coerce_item(other)]),
        }
    }
}

fn coerce_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn coerce_meta(value: Option<Value>) -> Meta {
    match value {
        Some(Value::Object(map)) => map.into_iter().map(|(k, v)| (k, coerce_text(v))).collect(),
        _ => Meta::new(),
    }
}

fn coerce_item(item: Value) -> (String, Meta) {
    match item {
        Value::Array(mut parts) if !parts.is_empty() => {
            let meta = if parts.len() > 1 { Some(parts.swap_remove(1)) } else { None };
            (coerce_text(parts.swap_remove(0)), coerce_meta(meta))
        }
        Value::Object(mut map) if map.contains_key("text") => {
            let text = map.remove("text").map(coerce_text).unwrap_or_default();
            (text, coerce_meta(map.remove("metadata")))
        }
        other => (coerce_text(other), Meta::new()),
    }
}

impl From<&str> for DocumentBatch {
    fn from(text: &str) -> Self {
        DocumentBatch::Single(text.to_string())
    }
}

impl From<String> for DocumentBatch {
    fn from(text: String) -> Self {
        DocumentBatch::Single(text)
    }
}

impl From<Vec<String>> for DocumentBatch {
    fn from(texts: Vec<String>) -> Self {
        DocumentBatch::Texts(texts)
    }
}

impl From<Vec<&str>> for DocumentBatch {
    fn from(texts: Vec<&str>) -> Self {
        DocumentBatch::Texts(texts.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for DocumentBatch {
    fn from(texts: &[&str]) -> Self {
        DocumentBatch::Texts(texts.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<(String, Meta)>> for DocumentBatch {
    fn from(pairs: Vec<(String, Meta)>) -> Self {
        DocumentBatch::Pairs(pairs)
    }
}

impl From<Vec<(&str, Meta)>> for DocumentBatch {
    fn from(pairs: Vec<(&str, Meta)>) -> Self {
        DocumentBatch::Pairs(pairs.into_iter().map(|(t, m)| (t.to_string(), m)).collect())
    }
}

impl From<Vec<Chunk>> for DocumentBatch {
    fn from(chunks: Vec<Chunk>) -> Self {
        DocumentBatch::Pairs(chunks.into_iter().map(|c| (c.text, c.metadata)).collect())
    }
}

impl From<Value> for DocumentBatch {
    fn from(value: Value) -> Self {
        DocumentBatch::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_inputs_get_empty_metadata() {
        let chunks = DocumentBatch::from(vec!["a", "b"]).into_chunks();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.metadata.is_empty()));
        assert_eq!(DocumentBatch::from("solo").into_chunks()[0].text, "solo");
    }

    #[test]
    fn json_items_are_coerced() {
        let batch = DocumentBatch::from_json(json!([
            "plain",
            ["paired", {"id": 7, "preview": "pai"}],
            {"text": "object", "metadata": {"source": "notes"}},
            42,
            ["lonely"],
            null
        ]));
        let chunks = batch.into_chunks();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["plain", "paired", "object", "42", "lonely", "null"]);
        assert_eq!(chunks[1].metadata["id"], "7");
        assert_eq!(chunks[1].metadata["preview"], "pai");
        assert_eq!(chunks[2].metadata["source"], "notes");
        assert!(chunks[4].metadata.is_empty());
    }

    #[test]
    fn json_scalar_string_is_single() {
        assert_eq!(DocumentBatch::from_json(json!("x")), DocumentBatch::Single("x".into()));
    }
}
