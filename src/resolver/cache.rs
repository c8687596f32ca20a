//! Extraction cache keyed by payload content.
//!
//! Re-imports and duplicated rows carry byte-identical payloads, so extraction
//! results are memoized by the SHA-256 of the payload. The cache is an explicit
//! object handed to the resolver; there is no process-wide instance.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};

type PayloadDigest = [u8; 32];

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionCacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Memoized payload extraction results, including `None` outcomes.
pub struct ExtractionCache {
    entries: DashMap<PayloadDigest, Option<String>>,
    max_entries: Option<usize>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: None,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Stop inserting new entries once `max_entries` are cached.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::new()
        }
    }

    /// Return the cached result for `payload`, computing it with `extract` on a miss.
    pub fn get_or_extract<F>(&self, payload: &[u8], extract: F) -> Option<String>
    where
        F: FnOnce(&[u8]) -> Option<String>,
    {
        let digest: PayloadDigest = Sha256::digest(payload).into();

        if let Some(entry) = self.entries.get(&digest) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = extract(payload);

        let full = self
            .max_entries
            .is_some_and(|limit| self.entries.len() >= limit);
        if !full {
            self.entries.insert(digest, result.clone());
        }

        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ExtractionCacheStats {
        ExtractionCacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ExtractionCache {
    fn default() -> Self {
        Self::new()
    }
}
