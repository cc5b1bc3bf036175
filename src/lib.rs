//! Value index for an embedded XML document store.
//!
//! Maps content tokens (element text, attribute values) to opaque pointers
//! into an external ID-list store. The [`index::BalancedTree`] keeps tokens
//! sorted for exact, prefix and directional range queries; the
//! [`index::LookupCache`] absorbs repeated exact lookups within a session.
//!
//! ```
//! use valindex::index::{QueryDescriptor, ValueIndex};
//! use valindex::IndexOptions;
//!
//! let mut index = ValueIndex::new(&IndexOptions::default()).unwrap();
//! for (pointer, token) in ["ab", "abc", "abd", "b"].iter().enumerate() {
//!     index.insert(token.as_bytes(), 1, pointer as u64).unwrap();
//! }
//! let hits: Vec<&[u8]> = index
//!     .scan(QueryDescriptor::prefix("ab"))
//!     .map(|(key, _)| key)
//!     .collect();
//! assert_eq!(hits, [&b"ab"[..], &b"abc"[..], &b"abd"[..]]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod index;
pub mod options;
pub mod types;

pub use options::{DuplicatePolicy, IndexOptions};
pub use types::{Handle, IndexError, Payload, Result};
