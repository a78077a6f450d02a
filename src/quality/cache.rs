//! Session-scoped memoization of quality vectors.
//!
//! Each image id maps to a write-once cell. The first caller to miss on a key
//! runs the computation; concurrent callers for the same key wait on the
//! in-flight cell instead of recomputing. If the computing future is dropped
//! the cell stays empty and the next caller computes it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::OnceCell;

use crate::candidate::ImageId;

use super::vector::QualityVector;

/// Lookup statistics for a [`QualityCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered without running a computation.
    pub hits: u64,
    /// Lookups that ran the computation.
    pub misses: u64,
}

/// Memoizes per-image quality vectors for one curation session.
///
/// Entries are write-once: once a vector is stored for an id it is never
/// replaced until [`QualityCache::clear`] is called.
#[derive(Debug, Default)]
pub struct QualityCache {
    entries: RwLock<HashMap<ImageId, Arc<OnceCell<QualityVector>>>>,
    lookups: AtomicU64,
    misses: AtomicU64,
}

impl QualityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached vector for `id`, if one has been stored.
    pub fn get(&self, id: &ImageId) -> Option<QualityVector> {
        let entries = self.entries.read().expect("cache read lock poisoned");
        entries.get(id).and_then(|cell| cell.get().cloned())
    }

    /// Stores a vector for `id`.
    ///
    /// Returns `false` without modifying the cache if the key already holds
    /// a vector.
    pub fn set(&self, id: ImageId, vector: QualityVector) -> bool {
        let cell = self.cell(id);
        cell.set(vector).is_ok()
    }

    /// Returns the cached vector for `id`, computing it on a miss.
    ///
    /// At most one computation runs per key; concurrent callers share its
    /// result.
    pub async fn get_or_compute<F, Fut>(&self, id: &ImageId, compute: F) -> QualityVector
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QualityVector>,
    {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let cell = self.cell(id.clone());
        if let Some(vector) = cell.get() {
            return vector.clone();
        }

        let misses = &self.misses;
        cell.get_or_init(|| async move {
            misses.fetch_add(1, Ordering::Relaxed);
            compute().await
        })
        .await
        .clone()
    }

    /// Drops every entry. In-flight computations finish into detached cells.
    pub fn clear(&self) {
        self.entries
            .write()
            .expect("cache write lock poisoned")
            .clear();
    }

    /// Number of keys holding a stored vector.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("cache read lock poisoned")
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits: lookups.saturating_sub(misses),
            misses,
        }
    }

    fn cell(&self, id: ImageId) -> Arc<OnceCell<QualityVector>> {
        if let Some(cell) = self
            .entries
            .read()
            .expect("cache read lock poisoned")
            .get(&id)
        {
            return Arc::clone(cell);
        }
        let mut entries = self.entries.write().expect("cache write lock poisoned");
        Arc::clone(entries.entry(id).or_default())
    }
}
