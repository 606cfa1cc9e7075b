//! JSON file snapshot of short-term memory.
//!
//! The whole memory is written to `{dir}/short_term_memory.json` on every
//! save. Each save writes its own temp file and renames it into place under
//! a lock, so a crash or a concurrent save never leaves a torn snapshot.
//! This store does blocking IO; the server wraps it in a
//! [`SnapshotWriter`](super::writer::SnapshotWriter).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use agentline_core::memory::snapshot::SnapshotStore;
use agentline_types::error::MemoryError;
use agentline_types::memory::MemoryItem;

pub const SNAPSHOT_FILE: &str = "short_term_memory.json";

pub struct JsonSnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    next_temp: AtomicU64,
}

impl JsonSnapshotStore {
    /// Store under `dir`, which is created if missing.
    pub fn new(dir: &Path) -> Result<Self, MemoryError> {
        std::fs::create_dir_all(dir).map_err(|e| MemoryError::Io(e.to_string()))?;
        Ok(Self {
            path: dir.join(SNAPSHOT_FILE),
            write_lock: Mutex::new(()),
            next_temp: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let n = self.next_temp.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_extension(format!("json.{}.{n}.tmp", std::process::id()))
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Result<Vec<MemoryItem>, MemoryError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MemoryError::Io(e.to_string())),
        };
        serde_json::from_slice(&bytes).map_err(|e| MemoryError::Corrupt(e.to_string()))
    }

    fn save(&self, items: &[MemoryItem]) -> Result<(), MemoryError> {
        let json =
            serde_json::to_vec_pretty(items).map_err(|e| MemoryError::Corrupt(e.to_string()))?;
        let tmp = self.temp_path();

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = std::fs::write(&tmp, json) {
            let _ = std::fs::remove_file(&tmp);
            return Err(MemoryError::Io(e.to_string()));
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            MemoryError::Io(e.to_string())
        })?;
        tracing::trace!(count = items.len(), path = %self.path.display(), "memory snapshot saved");
        Ok(())
    }
}
