//! `Store` implementations: a single-file, whole-map-rewrite durable store
//! and a bare in-memory one for tests and benches. Both guard their map
//! behind a `parking_lot::Mutex`, following the locking style used
//! throughout `annvec`'s own core.

use annvec::{CoreError, CoreResult, Store};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

/// A `Store` backed by one file on disk holding a `bincode`-encoded
/// `HashMap<i32, Vec<u8>>`. Every [`FileStore::upsert`] rewrites the whole
/// file — adequate for the batch-oriented `inputfile`/`serve` workflows
/// this crate targets, not for high write-rate online updates.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<HashMap<i32, Vec<u8>>>,
}

impl FileStore {
    /// Opens (or creates) the store at `path`, loading any existing
    /// contents immediately.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let mut file = OpenOptions::new()
                .read(true)
                .open(&path)
                .map_err(|e| CoreError::internal(format!("opening store file: {e}")))?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .map_err(|e| CoreError::internal(format!("reading store file: {e}")))?;
            if bytes.is_empty() {
                HashMap::new()
            } else {
                bincode::deserialize(&bytes).map_err(|e| CoreError::internal(format!("decoding store file: {e}")))?
            }
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| CoreError::internal(format!("creating store directory: {e}")))?;
            }
            HashMap::new()
        };
        tracing::info!(path = %path.display(), records = data.len(), "file store opened");
        Ok(Self { path, data: Mutex::new(data) })
    }

    fn persist(&self, data: &HashMap<i32, Vec<u8>>) -> CoreResult<()> {
        let bytes = bincode::serialize(data).map_err(|e| CoreError::internal(format!("encoding store file: {e}")))?;
        let tmp_path = tmp_path_for(&self.path);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| CoreError::internal(format!("writing store file: {e}")))?;
        file.write_all(&bytes)
            .map_err(|e| CoreError::internal(format!("writing store file: {e}")))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| CoreError::internal(format!("committing store file: {e}")))?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

impl Store for FileStore {
    fn upsert(&self, id: i32, bytes: Vec<u8>) -> CoreResult<()> {
        let mut data = self.data.lock();
        data.insert(id, bytes);
        self.persist(&data)?;
        tracing::debug!(id, "upserted record");
        Ok(())
    }

    fn read(&self, id: i32) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.data.lock().get(&id).cloned())
    }

    fn read_all_keys(&self) -> CoreResult<Vec<i32>> {
        Ok(self.data.lock().keys().copied().collect())
    }
}

/// A `Store` with no backing file at all — for tests, benches, and
/// offline latency harnesses that build and tear down a corpus within one
/// process lifetime.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<i32, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn upsert(&self, id: i32, bytes: Vec<u8>) -> CoreResult<()> {
        self.data.lock().insert(id, bytes);
        Ok(())
    }

    fn read(&self, id: i32) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.data.lock().get(&id).cloned())
    }

    fn read_all_keys(&self) -> CoreResult<Vec<i32>> {
        Ok(self.data.lock().keys().copied().collect())
    }
}
