//! Block cursor: the last fully processed height.
//!
//! The in-memory position is authoritative. A `FileCursorStore` mirrors it to
//! disk so a restart resumes where the previous run stopped instead of at the
//! tip.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct CursorFile {
    height: u64,
}

/// JSON file holding the cursor, replaced atomically on each save.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> io::Result<Option<u64>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let file: CursorFile = serde_json::from_reader(reader)?;
        Ok(Some(file.height))
    }

    pub fn save(&self, height: u64) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &CursorFile { height })?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

/// The watcher's position on the chain.
#[derive(Debug, Default)]
pub struct WatcherCursor {
    height: Option<u64>,
    store: Option<FileCursorStore>,
}

impl WatcherCursor {
    /// A cursor that forgets its position on restart.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A cursor restored from, and mirrored to, `store`.
    pub fn persistent(store: FileCursorStore) -> io::Result<Self> {
        let height = store.load()?;
        if let Some(height) = height {
            tracing::info!(height, path = %store.path.display(), "Restored block cursor");
        }
        Ok(Self {
            height,
            store: Some(store),
        })
    }

    /// Last fully processed height, if any.
    pub fn position(&self) -> Option<u64> {
        self.height
    }

    /// Record `height` as fully processed.
    ///
    /// A failed write is logged; the in-memory position still moves so the
    /// running process does not reprocess the block.
    pub fn advance(&mut self, height: u64) {
        self.height = Some(height);
        if let Some(store) = &self.store {
            if let Err(e) = store.save(height) {
                tracing::error!(height, path = %store.path.display(), error = %e, "Failed to persist block cursor");
            }
        }
    }
}
