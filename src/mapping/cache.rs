//! Modification-time validated file cache.
//!
//! Every `load` stats the file; the file is re-read only when it has never
//! been loaded or its modification time is newer than the cached one. Cached
//! values are handed out as `Arc` snapshots and swapped whole on reload, so a
//! reader sees either the previous or the new decoded content.
//!
//! Two callers that notice the same change at once may both read the file.
//! The second insert is dropped if an equally fresh snapshot is already in
//! place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use tracing::{debug, info};

use crate::errors::{Error, Result};

struct CacheEntry<T> {
    value: Arc<T>,
    modified: SystemTime,
}

/// Process-wide cache of decoded file contents keyed by path.
pub struct FileCache<T> {
    entries: RwLock<HashMap<PathBuf, CacheEntry<T>>>,
    reads: AtomicU64,
}

impl<T> Default for FileCache<T> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()), reads: AtomicU64::new(0) }
    }
}

impl<T> FileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the decoded content of `path`, re-reading it if it changed.
    ///
    /// Stat, read and decode failures are returned to the caller and leave
    /// any previously cached snapshot in place.
    pub fn load_with<F>(&self, path: &Path, decode: F) -> Result<Arc<T>>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| Error::io_at(e, path))?;

        if let Some(value) = self.fresh(path, modified)? {
            return Ok(value);
        }

        let raw = fs::read_to_string(path).map_err(|e| Error::io_at(e, path))?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(decode(&raw).map_err(|e| e.context(path.display().to_string()))?);

        let mut entries =
            self.entries.write().map_err(|_| Error::sync("file cache lock poisoned"))?;
        if let Some(current) = entries.get(path) {
            if current.modified >= modified {
                debug!(path = %path.display(), "Concurrent reload already cached");
                return Ok(Arc::clone(&current.value));
            }
        }

        info!(path = %path.display(), bytes = raw.len(), "Loaded file into cache");
        entries.insert(path.to_path_buf(), CacheEntry { value: Arc::clone(&value), modified });
        Ok(value)
    }

    /// Number of times any file was read from disk.
    pub fn disk_reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    fn fresh(&self, path: &Path, modified: SystemTime) -> Result<Option<Arc<T>>> {
        let entries = self.entries.read().map_err(|_| Error::sync("file cache lock poisoned"))?;
        Ok(entries
            .get(path)
            .filter(|entry| modified <= entry.modified)
            .map(|entry| Arc::clone(&entry.value)))
    }
}

impl FileCache<String> {
    /// Raw file content.
    pub fn load(&self, path: &Path) -> Result<Arc<String>> {
        self.load_with(path, |raw| Ok(raw.to_string()))
    }
}
