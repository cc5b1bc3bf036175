//! Shared identifiers, payloads and the crate error type.
#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside the tree arena.
///
/// `Handle::NIL` marks an absent link; it is stored in place of `Option` so
/// that arena rows stay fixed-size and relocatable.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u32);

impl Handle {
    /// Sentinel meaning "no node".
    pub const NIL: Handle = Handle(u32::MAX);

    /// Returns `true` when this is the sentinel.
    #[inline]
    pub const fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    /// Converts the sentinel into `None`.
    #[inline]
    pub const fn get(self) -> Option<Handle> {
        if self.is_nil() {
            None
        } else {
            Some(self)
        }
    }

    /// Position of the node row inside the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<Option<Handle>> for Handle {
    fn from(value: Option<Handle>) -> Self {
        value.unwrap_or(Handle::NIL)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            f.write_str("nil")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Indexed entry attached to a token: an occurrence count plus an opaque
/// pointer into the external ID-list store.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Number of document nodes referenced by `pointer`.
    pub size: u32,
    /// Opaque reference understood only by the ID-list store.
    pub pointer: u64,
}

impl Payload {
    /// Builds a payload from its parts.
    pub const fn new(size: u32, pointer: u64) -> Self {
        Self { size, pointer }
    }
}

/// Errors surfaced by the value index.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// Underlying I/O failure (configuration files, token sources).
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// A handle pointed outside the arena or at the sentinel.
    #[error("invalid handle: {0}")]
    InvalidHandle(Handle),
    /// Structural corruption detected in the tree.
    #[error("invariant violated: {0}")]
    Invariant(&'static str),
    /// The key is already present and the duplicate policy rejects updates.
    #[error("duplicate key")]
    DuplicateKey,
    /// Configuration could not be parsed or failed validation.
    #[error("config: {0}")]
    Config(String),
    /// Invalid argument supplied by the caller.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IndexError>;
