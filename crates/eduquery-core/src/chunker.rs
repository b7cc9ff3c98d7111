use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::{Chunk, Meta};

const PREVIEW_CHARS: usize = 80;

/// Splits extracted document text into overlapping character windows.
#[derive(Debug, Clone)]
pub struct TextChunker {
    settings: ChunkingSettings,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self { settings: ChunkingSettings::default() }
    }
}

impl TextChunker {
    pub fn new(settings: ChunkingSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Windows of `chunk_size` characters, each starting
    /// `chunk_size - overlap` characters after the previous one. The last
    /// window may be shorter.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.settings.chunk_size - self.settings.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.settings.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            start += step;
        }
        chunks
    }

    /// Chunk `text` and tag each window with `source`, `chunk_index` and a
    /// short `preview`.
    pub fn chunk_document(&self, source: &str, text: &str) -> Vec<Chunk> {
        self.chunk_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, window)| {
                let mut metadata = Meta::new();
                metadata.insert("source".to_string(), source.to_string());
                metadata.insert("chunk_index".to_string(), i.to_string());
                metadata.insert("preview".to_string(), preview(&window));
                Chunk::with_metadata(window, metadata)
            })
            .collect()
    }

    /// Chunk one `.txt` file, or every `.txt` file under a directory in
    /// sorted path order.
    pub fn process_path(&self, path: &Path) -> Result<Vec<Chunk>> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let files = if path.is_dir() { list_txt_files(path) } else { vec![path.to_path_buf()] };
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "chunking file {}/{}", file_index + 1, files.len());
            let content = read_file_content(file_path)?;
            let source = file_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file_path.display().to_string());
            all_chunks.extend(self.chunk_document(&source, &content));
        }
        info!(files = files.len(), chunks = all_chunks.len(), "chunked documents");
        Ok(all_chunks)
    }
}

fn preview(window: &str) -> String {
    let collapsed = window.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(PREVIEW_CHARS).collect()
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}
