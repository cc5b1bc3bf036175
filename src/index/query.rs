#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Traversal direction for range scans.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest keys first.
    #[default]
    Ascending,
    /// Largest keys first.
    Descending,
}

/// Describes what a [`super::BalancedTree::scan`] should return.
///
/// A descriptor is handed to `scan` by value and consumed by it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryDescriptor {
    /// Every key whose bytes begin with `token`, ascending.
    Prefix {
        /// Leading bytes shared by all results.
        token: Vec<u8>,
    },
    /// Keys from `start` (or its nearest neighbour) onwards in `direction`.
    Range {
        /// Position to start from.
        start: Vec<u8>,
        /// Order in which keys are produced.
        direction: Direction,
    },
}

impl QueryDescriptor {
    /// Prefix match on `token`.
    pub fn prefix(token: impl Into<Vec<u8>>) -> Self {
        Self::Prefix {
            token: token.into(),
        }
    }

    /// Range scan starting at `start`.
    pub fn range(start: impl Into<Vec<u8>>, direction: Direction) -> Self {
        Self::Range {
            start: start.into(),
            direction,
        }
    }

    /// Keys `>= start`, ascending.
    pub fn ascending_from(start: impl Into<Vec<u8>>) -> Self {
        Self::range(start, Direction::Ascending)
    }

    /// Keys `<= start`, descending.
    pub fn descending_from(start: impl Into<Vec<u8>>) -> Self {
        Self::range(start, Direction::Descending)
    }

    /// The token the scan is positioned on.
    pub fn token(&self) -> &[u8] {
        match self {
            Self::Prefix { token } => token,
            Self::Range { start, .. } => start,
        }
    }

    /// Direction in which results are produced; prefix scans are ascending.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Prefix { .. } => Direction::Ascending,
            Self::Range { direction, .. } => *direction,
        }
    }
}
