//! Single-file JSON snapshot of an index: chunks plus the active
//! representation state.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use eduquery_core::error::{Error, Result};
use eduquery_core::types::Chunk;

use crate::mode::RepresentationState;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub chunks: Vec<Chunk>,
    pub representation: Option<RepresentationState>,
}

impl Snapshot {
    pub fn new(chunks: Vec<Chunk>, representation: Option<RepresentationState>) -> Self {
        Self { format_version: SNAPSHOT_VERSION, saved_at: Utc::now(), chunks, representation }
    }
}

/// Write through a temporary file in the target directory, then rename it
/// over `path`.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    debug!(path = %path.display(), chunks = snapshot.chunks.len(), "snapshot written");
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let reader = BufReader::new(File::open(path)?);
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    if snapshot.format_version != SNAPSHOT_VERSION {
        return Err(Error::Operation(format!(
            "unsupported snapshot version {} (expected {})",
            snapshot.format_version, SNAPSHOT_VERSION
        )));
    }
    Ok(snapshot)
}
