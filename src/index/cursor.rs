#![forbid(unsafe_code)]

use std::iter::FusedIterator;

use crate::types::{Handle, Payload};

use super::query::Direction;
use super::tree::BalancedTree;

/// Lazy, single-pass walk over a [`BalancedTree`].
///
/// Produced by [`BalancedTree::iter`] and [`BalancedTree::scan`]. Each call
/// to `next` yields the current entry and then steps to its in-order
/// neighbour, so a cursor costs nothing until it is advanced.
pub struct Cursor<'a> {
    tree: &'a BalancedTree,
    next: Option<Handle>,
    direction: Direction,
    prefix: Option<Vec<u8>>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn directed(
        tree: &'a BalancedTree,
        first: Option<Handle>,
        direction: Direction,
    ) -> Self {
        Self {
            tree,
            next: first,
            direction,
            prefix: None,
        }
    }

    pub(crate) fn prefix(tree: &'a BalancedTree, first: Option<Handle>, prefix: Vec<u8>) -> Self {
        Self {
            tree,
            next: first,
            direction: Direction::Ascending,
            prefix: Some(prefix),
        }
    }

    /// Direction in which this cursor moves.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = (&'a [u8], Payload);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let tree = self.tree;
        let (key, payload) = tree.entry(current);
        if let Some(prefix) = &self.prefix {
            if !key.starts_with(prefix) {
                self.next = None;
                return None;
            }
        }
        self.next = match self.direction {
            Direction::Ascending => tree.successor(current),
            Direction::Descending => tree.predecessor(current),
        };
        Some((key, payload))
    }
}

impl FusedIterator for Cursor<'_> {}
