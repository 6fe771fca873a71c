//! On-disk artifact store
//!
//! Cached artifacts live at `<root>/<normalized-name>/<filename>`. A
//! file that exists and is non-empty is complete and valid; backends
//! publish by temp-write-and-rename, so partial downloads never appear
//! under a final name.
//!
//! The store also hands out per-key fetch locks so two concurrent
//! misses on the same artifact serialize into a single upstream fetch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use wheelhouse_core::normalize_name;

use crate::backend::is_cached;

type CacheKey = (String, String);

/// Filesystem artifact cache
pub struct ArtifactStore {
    root: PathBuf,
    locks: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache directory for a distribution.
    pub fn cache_dir(&self, distribution: &str) -> PathBuf {
        self.root.join(normalize_name(distribution))
    }

    /// Deterministic cache path for one artifact.
    pub fn artifact_path(&self, distribution: &str, filename: &str) -> PathBuf {
        self.cache_dir(distribution).join(filename)
    }

    /// Cached artifact path, when present and complete.
    pub fn lookup(&self, distribution: &str, filename: &str) -> Option<PathBuf> {
        let path = self.artifact_path(distribution, filename);
        is_cached(&path).then_some(path)
    }

    /// Per-key fetch lock. Holders of the lock must re-check
    /// [`ArtifactStore::lookup`] after acquiring it; a concurrent
    /// request may have completed the fetch while they waited.
    pub fn fetch_lock(&self, distribution: &str, filename: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = (normalize_name(distribution), filename.to_string());
        let mut locks = self.locks.lock().expect("lock map poisoned");
        // Sweep entries no request holds any more; requests pick the
        // key, so the map must stay bounded by in-flight fetches.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(key).or_default())
    }
}
