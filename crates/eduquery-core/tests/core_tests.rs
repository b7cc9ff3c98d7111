use std::fs;
use tempfile::TempDir;

use eduquery_core::chunker::TextChunker;
use eduquery_core::config::{ChunkingSettings, Config, RetrievalSettings};
use eduquery_core::error::Error;

#[test]
fn chunk_text_windows_overlap() {
    let chunker = TextChunker::new(ChunkingSettings { chunk_size: 4, overlap: 1 }).expect("chunker");
    let chunks = chunker.chunk_text("abcdefghij");
    assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
}

#[test]
fn chunk_text_counts_characters_not_bytes() {
    let chunker = TextChunker::new(ChunkingSettings { chunk_size: 2, overlap: 0 }).expect("chunker");
    assert_eq!(chunker.chunk_text("éàü"), vec!["éà", "ü"]);
    assert!(chunker.chunk_text("").is_empty());
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    let err = TextChunker::new(ChunkingSettings { chunk_size: 10, overlap: 10 }).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn process_path_reads_sorted_txt_files_with_metadata() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.txt"), "Mitosis is cell division.").unwrap();
    fs::write(dir.join("a.txt"), "Plants use chlorophyll.").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();

    let chunks = TextChunker::default().process_path(dir).expect("process");

    assert_eq!(chunks.len(), 2, "one short file becomes one chunk");
    assert_eq!(chunks[0].text, "Plants use chlorophyll.");
    assert_eq!(chunks[0].metadata["source"], "a");
    assert_eq!(chunks[0].metadata["chunk_index"], "0");
    assert_eq!(chunks[1].metadata["source"], "b");
}

#[test]
fn process_path_missing_is_not_found() {
    let err = TextChunker::default().process_path(std::path::Path::new("/definitely/not/here")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn retrieval_settings_default_when_table_absent() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_in(tmp.path()).expect("config");
    assert_eq!(config.retrieval().expect("settings"), RetrievalSettings::default());
}

#[test]
fn retrieval_settings_from_toml_resolve_snapshot_path() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval]\nsnapshot_path = \"data/index.json\"\nsnippet_chars = 120\n\n[retrieval.chunking]\nchunk_size = 800\n",
    )
    .unwrap();

    let settings = Config::load_in(tmp.path()).expect("config").retrieval().expect("settings");

    assert_eq!(settings.snippet_chars, 120);
    assert_eq!(settings.chunking.chunk_size, 800);
    assert_eq!(settings.chunking.overlap, 50, "unset fields keep defaults");
    assert_eq!(settings.snapshot_path, Some(tmp.path().join("data/index.json")));
}

#[test]
fn invalid_chunking_in_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[retrieval.chunking]\nchunk_size = 10\noverlap = 20\n").unwrap();
    let config = Config::load_in(tmp.path()).expect("config");
    assert!(config.retrieval().is_err());
}
