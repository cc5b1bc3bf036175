use serde::Serialize;
use tracing::{debug, trace};

use crate::options::IndexOptions;
use crate::types::{Handle, Payload, Result};

use super::cache::{CacheStats, LookupCache};
use super::cursor::Cursor;
use super::query::QueryDescriptor;
use super::tree::BalancedTree;

/// Snapshot of index and cache counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IndexStats {
    /// Distinct tokens stored in the tree.
    pub entries: usize,
    /// Longest root-to-leaf path.
    pub height: usize,
    /// Settled nodes on every root-to-leaf path.
    pub black_height: usize,
    /// Rotations performed while building the tree.
    pub rotations: u64,
    /// Entries currently cached.
    pub cached: usize,
    /// Cache counters since the last reset.
    pub cache: CacheStats,
}

/// A tree plus the lookup cache that fronts it for one session.
///
/// Exact lookups consult the cache first and populate it on a miss; prefix
/// and range scans always go to the tree.
pub struct ValueIndex {
    tree: BalancedTree,
    cache: LookupCache,
}

impl ValueIndex {
    /// Creates an empty index.
    pub fn new(options: &IndexOptions) -> Result<Self> {
        let cache = LookupCache::with_options(options)?;
        debug!(cache = options.cache_capacity, "value_index.open");
        Ok(Self {
            tree: BalancedTree::with_options(options),
            cache,
        })
    }

    /// Wraps an existing tree with a fresh cache.
    pub fn from_tree(tree: BalancedTree, options: &IndexOptions) -> Result<Self> {
        Ok(Self {
            tree,
            cache: LookupCache::with_options(options)?,
        })
    }

    /// Builder-side insert. A cached entry for `key` is refreshed so that
    /// later lookups never see the pre-update payload.
    pub fn insert(&mut self, key: &[u8], size: u32, pointer: u64) -> Result<Handle> {
        let handle = self.tree.insert(key, size, pointer)?;
        if self.cache.contains(key) {
            let stored = self.tree.store().get(handle)?.payload();
            self.cache.add(key, stored.size, stored.pointer);
        }
        Ok(handle)
    }

    /// Exact lookup through the cache.
    pub fn lookup(&mut self, key: &[u8]) -> Option<Payload> {
        if let Some(payload) = self.cache.get(key) {
            return Some(payload);
        }
        let payload = self.tree.lookup(key)?;
        trace!(len = key.len(), "value_index.populate");
        self.cache.add(key, payload.size, payload.pointer);
        Some(payload)
    }

    /// Prefix or range scan on the tree.
    pub fn scan(&self, descriptor: QueryDescriptor) -> Cursor<'_> {
        self.tree.scan(descriptor)
    }

    /// Distinct tokens stored.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Borrows the tree.
    pub fn tree(&self) -> &BalancedTree {
        &self.tree
    }

    /// Borrows the cache.
    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Mutable access to the cache, e.g. to `delete` entries the caller
    /// knows to be stale.
    pub fn cache_mut(&mut self) -> &mut LookupCache {
        &mut self.cache
    }

    /// Ends a session: drops every cached entry and resets counters.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Current counters.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.tree.len(),
            height: self.tree.height(),
            black_height: self.tree.black_height(),
            rotations: self.tree.rotations(),
            cached: self.cache.len(),
            cache: self.cache.stats(),
        }
    }

    /// Releases the tree, discarding the cache.
    pub fn into_tree(self) -> BalancedTree {
        self.tree
    }
}
