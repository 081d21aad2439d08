//! Mapping document model and its file-backed store.

pub mod cache;
pub mod document;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use cache::FileCache;
pub use document::{
    MappingDocument, MappingEntry, MethodMapping, ResourceParamSource, UrlMapping,
};

use crate::errors::Result;

/// The mapping document backing a classifier, reloaded when its file changes.
pub struct MappingStore {
    path: PathBuf,
    cache: FileCache<MappingDocument>,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: FileCache::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document snapshot.
    pub fn document(&self) -> Result<Arc<MappingDocument>> {
        self.cache.load_with(&self.path, MappingDocument::from_json)
    }

    /// Number of times the mapping file was read from disk.
    pub fn disk_reads(&self) -> u64 {
        self.cache.disk_reads()
    }
}

impl std::fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStore")
            .field("path", &self.path)
            .field("disk_reads", &self.disk_reads())
            .finish()
    }
}
