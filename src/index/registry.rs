//! Compile-time registry of the value indexes a document keeps.
//!
//! Each [`IndexKind`] maps to a constructor in [`REGISTRY`]; callers reach the
//! concrete index only through the [`TokenIndex`] trait.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::IndexOptions;
use crate::types::{Handle, IndexError, Payload, Result};

use super::cache::CacheEntry;
use super::cursor::Cursor;
use super::query::QueryDescriptor;
use super::value_index::{IndexStats, ValueIndex};

/// Which document content an index covers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Element text content.
    Text,
    /// Attribute values.
    Attribute,
}

impl IndexKind {
    /// Every kind, in registry order.
    pub const ALL: [IndexKind; 2] = [IndexKind::Text, IndexKind::Attribute];

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            IndexKind::Text => "text",
            IndexKind::Attribute => "attribute",
        }
    }

    const fn slot(self) -> usize {
        match self {
            IndexKind::Text => 0,
            IndexKind::Attribute => 1,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(IndexKind::Text),
            "attribute" => Ok(IndexKind::Attribute),
            _ => Err(IndexError::Invalid("unknown index kind")),
        }
    }
}

/// Operations the builder and evaluator need from a token index.
pub trait TokenIndex {
    /// Records a token.
    fn insert_token(&mut self, key: &[u8], size: u32, pointer: u64) -> Result<Handle>;

    /// Exact lookup.
    fn lookup_token(&mut self, key: &[u8]) -> Option<Payload>;

    /// Prefix or range scan.
    fn scan_tokens(&self, descriptor: QueryDescriptor) -> Cursor<'_>;

    /// Distinct tokens stored.
    fn token_count(&self) -> usize;

    /// Shape and cache counters.
    fn index_stats(&self) -> IndexStats;

    /// Cached tokens, most recently used first.
    fn cached_tokens(&self) -> Vec<CacheEntry<'_>>;
}

impl TokenIndex for ValueIndex {
    fn insert_token(&mut self, key: &[u8], size: u32, pointer: u64) -> Result<Handle> {
        self.insert(key, size, pointer)
    }

    fn lookup_token(&mut self, key: &[u8]) -> Option<Payload> {
        self.lookup(key)
    }

    fn scan_tokens(&self, descriptor: QueryDescriptor) -> Cursor<'_> {
        self.scan(descriptor)
    }

    fn token_count(&self) -> usize {
        self.len()
    }

    fn index_stats(&self) -> IndexStats {
        self.stats()
    }

    fn cached_tokens(&self) -> Vec<CacheEntry<'_>> {
        self.cache().iter().collect()
    }
}

/// Constructor stored in the registry.
pub type IndexFactory = fn(&IndexOptions) -> Result<Box<dyn TokenIndex>>;

fn cached_index(options: &IndexOptions) -> Result<Box<dyn TokenIndex>> {
    Ok(Box::new(ValueIndex::new(options)?))
}

/// Kind → constructor table.
pub const REGISTRY: [(IndexKind, IndexFactory); 2] = [
    (IndexKind::Text, cached_index),
    (IndexKind::Attribute, cached_index),
];

/// One index per [`IndexKind`], built from [`REGISTRY`].
pub struct ValueIndexes {
    slots: Vec<Box<dyn TokenIndex>>,
}

impl ValueIndexes {
    /// Instantiates every registered kind with the same options.
    pub fn new(options: &IndexOptions) -> Result<Self> {
        options.validate()?;
        let mut slots = Vec::with_capacity(REGISTRY.len());
        for (kind, factory) in REGISTRY {
            debug_assert_eq!(kind.slot(), slots.len());
            slots.push(factory(options)?);
        }
        Ok(Self { slots })
    }

    /// Index for `kind`.
    pub fn get(&self, kind: IndexKind) -> &dyn TokenIndex {
        self.slots[kind.slot()].as_ref()
    }

    /// Mutable index for `kind`.
    pub fn get_mut(&mut self, kind: IndexKind) -> &mut dyn TokenIndex {
        self.slots[kind.slot()].as_mut()
    }
}
