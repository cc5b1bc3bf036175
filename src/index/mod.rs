//! Token value index: a balanced search tree over byte-string keys and the
//! lookup cache that fronts it.
#![forbid(unsafe_code)]

mod cache;
mod cursor;
mod node_store;
mod query;
mod registry;
mod tree;
mod value_index;


pub use cache::{CacheEntry, CacheStats, LookupCache};
pub use cursor::Cursor;
pub use node_store::{Node, NodeStore};
pub use query::{Direction, QueryDescriptor};
pub use registry::{IndexFactory, IndexKind, TokenIndex, ValueIndexes, REGISTRY};
pub use tree::BalancedTree;
pub use value_index::{IndexStats, ValueIndex};
