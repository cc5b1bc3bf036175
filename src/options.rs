use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{IndexError, Result};

/// Default number of entries held by the lookup cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// What `insert` does when the key is already stored.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Overwrite the stored size/pointer and keep the tree shape.
    #[default]
    Update,
    /// Fail with [`IndexError::DuplicateKey`].
    Reject,
}

/// Configuration for a value index and its lookup cache.
///
/// Can be built in code with the chained setters or read from TOML:
///
/// ```toml
/// cache_capacity = 4096
/// initial_node_capacity = 100000
/// duplicate_policy = "reject"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexOptions {
    /// Maximum entries in the lookup cache; must be non-zero.
    pub cache_capacity: usize,
    /// Rows reserved up front in the node arena.
    pub initial_node_capacity: usize,
    /// Behaviour of `insert` on an existing key.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            initial_node_capacity: 0,
            duplicate_policy: DuplicatePolicy::Update,
        }
    }
}

impl IndexOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lookup cache capacity.
    pub fn with_cache_capacity(mut self, entries: usize) -> Self {
        self.cache_capacity = entries;
        self
    }

    /// Sets the number of arena rows reserved up front.
    pub fn with_initial_node_capacity(mut self, rows: usize) -> Self {
        self.initial_node_capacity = rows;
        self
    }

    /// Sets the duplicate-key policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Cache capacity as a non-zero count.
    pub fn cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| IndexError::Config("cache_capacity must be greater than zero".into()))
    }

    /// Checks that the options describe a usable index.
    pub fn validate(&self) -> Result<()> {
        self.cache_capacity().map(|_| ())
    }

    /// Parses and validates options from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let options: Self = toml::from_str(raw).map_err(|err| IndexError::Config(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
