use std::hash::BuildHasherDefault;
use std::num::NonZeroUsize;

use lru::LruCache;
use rustc_hash::FxHasher;
use serde::Serialize;
use tracing::{debug, trace};

use crate::options::IndexOptions;
use crate::types::{Payload, Result};

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Hit/miss/eviction counters aggregated per session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls answered from the cache.
    pub hits: u64,
    /// Number of `get` calls for absent keys.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
}

/// Borrowed view of one cached token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheEntry<'a> {
    /// Token bytes.
    pub key: &'a [u8],
    /// Size and pointer recorded for the token.
    pub payload: Payload,
}

/// Bounded token → payload map placed in front of the tree.
///
/// Entries are kept in least-recently-used order; once `capacity` entries are
/// held, adding a new key drops the one that was read or written longest ago.
pub struct LookupCache {
    entries: LruCache<Vec<u8>, Payload, FxBuildHasher>,
    stats: CacheStats,
}

impl LookupCache {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        debug!(capacity = capacity.get(), "lookup_cache.open");
        Self {
            entries: LruCache::with_hasher(capacity, FxBuildHasher::default()),
            stats: CacheStats::default(),
        }
    }

    /// Creates a cache sized by `options.cache_capacity`.
    pub fn with_options(options: &IndexOptions) -> Result<Self> {
        Ok(Self::new(options.cache_capacity()?))
    }

    /// Records `size`/`pointer` for `key`, overwriting an existing entry.
    pub fn add(&mut self, key: &[u8], size: u32, pointer: u64) {
        let payload = Payload::new(size, pointer);
        if let Some(slot) = self.entries.get_mut(key) {
            trace!(len = key.len(), "lookup_cache.overwrite");
            *slot = payload;
            return;
        }
        if let Some((evicted, _)) = self.entries.push(key.to_vec(), payload) {
            trace!(len = evicted.len(), "lookup_cache.evict");
            self.stats.evictions += 1;
        }
    }

    /// Returns the entry for `key`, marking it most recently used.
    pub fn get(&mut self, key: &[u8]) -> Option<Payload> {
        match self.entries.get(key) {
            Some(payload) => {
                self.stats.hits += 1;
                trace!(len = key.len(), "lookup_cache.hit");
                Some(*payload)
            }
            None => {
                self.stats.misses += 1;
                trace!(len = key.len(), "lookup_cache.miss");
                None
            }
        }
    }

    /// Returns the entry for `key` without touching recency or counters.
    pub fn peek(&self, key: &[u8]) -> Option<Payload> {
        self.entries.peek(key).copied()
    }

    /// Returns `true` if `key` is cached.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains(key)
    }

    /// Removes `key`; absent keys are ignored.
    pub fn delete(&mut self, key: &[u8]) {
        if self.entries.pop(key).is_some() {
            trace!(len = key.len(), "lookup_cache.delete");
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries held at once.
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.cap()
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = CacheEntry<'_>> {
        self.entries.iter().map(|(key, payload)| CacheEntry {
            key: key.as_slice(),
            payload: *payload,
        })
    }

    /// Drops all entries and resets the counters.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "lookup_cache.clear");
        self.entries.clear();
        self.stats = CacheStats::default();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns the current counters and resets them.
    pub fn take_stats(&mut self) -> CacheStats {
        let stats = self.stats;
        self.stats = CacheStats::default();
        stats
    }
}
