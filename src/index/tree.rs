#![forbid(unsafe_code)]

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::options::{DuplicatePolicy, IndexOptions};
use crate::types::{Handle, IndexError, Payload, Result};

use super::cursor::Cursor;
use super::node_store::NodeStore;
use super::query::{Direction, QueryDescriptor};

/// Balanced binary search tree over byte-string tokens.
///
/// Nodes live in a [`NodeStore`] and link to each other by [`Handle`].
/// Balance is kept with a per-node `changed` flag that plays the role of
/// "red" in a red-black tree: after every insert the root is settled, no
/// two adjacent nodes are changed, and every root-to-leaf path crosses the
/// same number of settled nodes.
///
/// Scans borrow the tree immutably while `insert` needs `&mut self`, so a
/// traversal can never observe a rotation half way through.
#[derive(Clone, Debug)]
pub struct BalancedTree {
    store: NodeStore,
    policy: DuplicatePolicy,
    rotations: u64,
}

impl Default for BalancedTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BalancedTree {
    /// Creates an empty tree that updates duplicates in place.
    pub fn new() -> Self {
        Self {
            store: NodeStore::new(),
            policy: DuplicatePolicy::default(),
            rotations: 0,
        }
    }

    /// Creates an empty tree configured from `options`.
    pub fn with_options(options: &IndexOptions) -> Self {
        debug!(
            capacity = options.initial_node_capacity,
            policy = ?options.duplicate_policy,
            "vtree.open"
        );
        Self {
            store: NodeStore::with_capacity(options.initial_node_capacity),
            policy: options.duplicate_policy,
            rotations: 0,
        }
    }

    /// Adopts a previously built arena, validating its structure first.
    pub fn from_store(store: NodeStore, policy: DuplicatePolicy) -> Result<Self> {
        let tree = Self {
            store,
            policy,
            rotations: 0,
        };
        tree.validate()?;
        debug!(nodes = tree.len(), "vtree.adopt");
        Ok(tree)
    }

    /// Borrows the underlying arena.
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Releases the underlying arena.
    pub fn into_store(self) -> NodeStore {
        self.store
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` when no key has been inserted.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Policy applied when `insert` meets an existing key.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Rotations performed by this instance since it was created.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Inserts `key` and rebalances.
    ///
    /// An existing key is handled according to the duplicate policy: with
    /// [`DuplicatePolicy::Update`] its payload is overwritten and its handle
    /// returned without touching the tree shape, with
    /// [`DuplicatePolicy::Reject`] the call fails with
    /// [`IndexError::DuplicateKey`].
    pub fn insert(&mut self, key: &[u8], size: u32, pointer: u64) -> Result<Handle> {
        let payload = Payload::new(size, pointer);
        let mut cursor = self.store.root();
        let mut parent = None;
        let mut went_left = false;
        while let Some(current) = cursor {
            parent = Some(current);
            match key.cmp(self.store.key(current)) {
                Ordering::Less => {
                    went_left = true;
                    cursor = self.store.left(current);
                }
                Ordering::Greater => {
                    went_left = false;
                    cursor = self.store.right(current);
                }
                Ordering::Equal => {
                    return match self.policy {
                        DuplicatePolicy::Update => {
                            trace!(len = key.len(), "vtree.insert.update");
                            self.store.set_payload(current, payload);
                            Ok(current)
                        }
                        DuplicatePolicy::Reject => Err(IndexError::DuplicateKey),
                    };
                }
            }
        }

        let handle = self.store.push(key, payload, parent)?;
        match parent {
            None => self.store.set_root(Some(handle)),
            Some(p) if went_left => self.store.set_left(p, Some(handle)),
            Some(p) => self.store.set_right(p, Some(handle)),
        }
        trace!(len = key.len(), handle = handle.0, "vtree.insert");
        self.fix_after_insert(handle);
        Ok(handle)
    }

    /// Exact-match lookup.
    pub fn lookup(&self, key: &[u8]) -> Option<Payload> {
        self.find(key).map(|h| self.store.payload(h))
    }

    /// Returns `true` if `key` is stored.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Handle of the node holding `key`.
    pub fn find(&self, key: &[u8]) -> Option<Handle> {
        let mut cursor = self.store.root();
        while let Some(current) = cursor {
            cursor = match key.cmp(self.store.key(current)) {
                Ordering::Less => self.store.left(current),
                Ordering::Greater => self.store.right(current),
                Ordering::Equal => return Some(current),
            };
        }
        None
    }

    /// Runs the query described by `descriptor`.
    pub fn scan(&self, descriptor: QueryDescriptor) -> Cursor<'_> {
        match descriptor {
            QueryDescriptor::Prefix { token } => {
                let start = self.seek(&token, Direction::Ascending);
                Cursor::prefix(self, start, token)
            }
            QueryDescriptor::Range { start, direction } => self.range(&start, direction),
        }
    }

    /// Full ascending traversal starting at the left-most node.
    pub fn iter(&self) -> Cursor<'_> {
        let first = self.store.root().map(|root| self.leftmost(root));
        Cursor::directed(self, first, Direction::Ascending)
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Keys from `start` onwards in `direction`; shorthand for a
    /// [`QueryDescriptor::Range`] scan.
    pub fn range(&self, start: &[u8], direction: Direction) -> Cursor<'_> {
        let first = self.seek(start, direction);
        Cursor::directed(self, first, direction)
    }

    /// Positions on the first key `>= key` (ascending) or `<= key`
    /// (descending).
    ///
    /// Descends as for a lookup; if the key is absent the last node visited
    /// is either the answer or its in-order neighbour is.
    fn seek(&self, key: &[u8], direction: Direction) -> Option<Handle> {
        let mut cursor = self.store.root();
        let mut last = None;
        while let Some(current) = cursor {
            let ord = key.cmp(self.store.key(current));
            last = Some((current, ord));
            cursor = match ord {
                Ordering::Less => self.store.left(current),
                Ordering::Greater => self.store.right(current),
                Ordering::Equal => return Some(current),
            };
        }
        let (node, ord) = last?;
        match (direction, ord) {
            (Direction::Ascending, Ordering::Less) => Some(node),
            (Direction::Ascending, _) => self.successor(node),
            (Direction::Descending, Ordering::Greater) => Some(node),
            (Direction::Descending, _) => self.predecessor(node),
        }
    }

    pub(crate) fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.store.left(handle) {
            handle = left;
        }
        handle
    }

    pub(crate) fn rightmost(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.store.right(handle) {
            handle = right;
        }
        handle
    }

    /// In-order successor: left-most node of the right subtree, or the
    /// nearest ancestor reached from its left side.
    pub(crate) fn successor(&self, handle: Handle) -> Option<Handle> {
        if let Some(right) = self.store.right(handle) {
            return Some(self.leftmost(right));
        }
        let mut child = handle;
        let mut parent = self.store.parent(handle);
        while let Some(p) = parent {
            if self.store.right(p) != Some(child) {
                break;
            }
            child = p;
            parent = self.store.parent(p);
        }
        parent
    }

    pub(crate) fn predecessor(&self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self.store.left(handle) {
            return Some(self.rightmost(left));
        }
        let mut child = handle;
        let mut parent = self.store.parent(handle);
        while let Some(p) = parent {
            if self.store.left(p) != Some(child) {
                break;
            }
            child = p;
            parent = self.store.parent(p);
        }
        parent
    }

    pub(crate) fn entry(&self, handle: Handle) -> (&[u8], Payload) {
        (self.store.key(handle), self.store.payload(handle))
    }

    // Sentinel-tolerant helpers so the fixup walk reads like the classic
    // formulation even where a grandparent or uncle is missing.

    fn parent_of(&self, handle: Option<Handle>) -> Option<Handle> {
        handle.and_then(|h| self.store.parent(h))
    }

    fn left_of(&self, handle: Option<Handle>) -> Option<Handle> {
        handle.and_then(|h| self.store.left(h))
    }

    fn right_of(&self, handle: Option<Handle>) -> Option<Handle> {
        handle.and_then(|h| self.store.right(h))
    }

    fn changed_of(&self, handle: Option<Handle>) -> bool {
        handle.is_some_and(|h| self.store.is_changed(h))
    }

    fn mark(&mut self, handle: Option<Handle>, changed: bool) {
        if let Some(h) = handle {
            self.store.set_changed(h, changed);
        }
    }

    fn fix_after_insert(&mut self, handle: Handle) {
        let mut x = handle;
        self.store.set_changed(x, true);

        while Some(x) != self.store.root() && self.changed_of(self.parent_of(Some(x))) {
            let parent = self.parent_of(Some(x));
            let grand = self.parent_of(parent);
            if parent == self.left_of(grand) {
                let uncle = self.right_of(grand);
                if self.changed_of(uncle) {
                    self.mark(parent, false);
                    self.mark(uncle, false);
                    self.mark(grand, true);
                    match grand {
                        Some(g) => x = g,
                        None => break,
                    }
                } else {
                    if Some(x) == self.right_of(parent) {
                        if let Some(p) = parent {
                            x = p;
                            self.rotate_left(x);
                        }
                    }
                    let parent = self.parent_of(Some(x));
                    let grand = self.parent_of(parent);
                    self.mark(parent, false);
                    self.mark(grand, true);
                    if let Some(g) = grand {
                        self.rotate_right(g);
                    }
                }
            } else {
                let uncle = self.left_of(grand);
                if self.changed_of(uncle) {
                    self.mark(parent, false);
                    self.mark(uncle, false);
                    self.mark(grand, true);
                    match grand {
                        Some(g) => x = g,
                        None => break,
                    }
                } else {
                    if Some(x) == self.left_of(parent) {
                        if let Some(p) = parent {
                            x = p;
                            self.rotate_right(x);
                        }
                    }
                    let parent = self.parent_of(Some(x));
                    let grand = self.parent_of(parent);
                    self.mark(parent, false);
                    self.mark(grand, true);
                    if let Some(g) = grand {
                        self.rotate_left(g);
                    }
                }
            }
        }

        let root = self.store.root();
        self.mark(root, false);
    }

    fn rotate_left(&mut self, pivot: Handle) {
        let Some(right) = self.store.right(pivot) else {
            return;
        };
        let inner = self.store.left(right);
        self.store.set_right(pivot, inner);
        if let Some(inner) = inner {
            self.store.set_parent(inner, Some(pivot));
        }
        let above = self.store.parent(pivot);
        self.store.set_parent(right, above);
        match above {
            None => self.store.set_root(Some(right)),
            Some(a) if self.store.left(a) == Some(pivot) => self.store.set_left(a, Some(right)),
            Some(a) => self.store.set_right(a, Some(right)),
        }
        self.store.set_left(right, Some(pivot));
        self.store.set_parent(pivot, Some(right));
        self.rotations += 1;
        trace!(pivot = pivot.0, "vtree.rotate_left");
    }

    fn rotate_right(&mut self, pivot: Handle) {
        let Some(left) = self.store.left(pivot) else {
            return;
        };
        let inner = self.store.right(left);
        self.store.set_left(pivot, inner);
        if let Some(inner) = inner {
            self.store.set_parent(inner, Some(pivot));
        }
        let above = self.store.parent(pivot);
        self.store.set_parent(left, above);
        match above {
            None => self.store.set_root(Some(left)),
            Some(a) if self.store.right(a) == Some(pivot) => self.store.set_right(a, Some(left)),
            Some(a) => self.store.set_left(a, Some(left)),
        }
        self.store.set_right(left, Some(pivot));
        self.store.set_parent(pivot, Some(left));
        self.rotations += 1;
        trace!(pivot = pivot.0, "vtree.rotate_right");
    }

    /// Longest root-to-leaf path, counted in nodes.
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(Handle, usize)> =
            self.store.root().map(|r| (r, 1)).into_iter().collect();
        while let Some((handle, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(self.store.left(handle).map(|c| (c, depth + 1)));
            stack.extend(self.store.right(handle).map(|c| (c, depth + 1)));
        }
        max
    }

    /// Settled nodes on the left spine; equal on every path of a valid tree.
    pub fn black_height(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.store.root();
        while let Some(handle) = cursor {
            if !self.store.is_changed(handle) {
                count += 1;
            }
            cursor = self.store.left(handle);
        }
        count
    }

    /// Walks the whole arena and checks every structural invariant:
    /// key order, parent back-links, a settled root, no adjacent changed
    /// nodes, uniform settled height and that every row is reachable.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.store.root() else {
            return if self.store.is_empty() {
                Ok(())
            } else {
                Err(IndexError::Invariant("arena has rows but no root"))
            };
        };
        let root_node = self.store.get(root)?;
        if root_node.parent().is_some() {
            return Err(IndexError::Invariant("root has a parent"));
        }
        if root_node.is_changed() {
            return Err(IndexError::Invariant("root left unsettled"));
        }
        let order = self.check_links(root)?;
        if order.len() != self.store.len() {
            return Err(IndexError::Invariant("unreachable rows in arena"));
        }
        self.check_settled_heights(&order)
    }

    /// Pre-order walk from `root` checking key bounds, parent back-links and
    /// changed-flag adjacency. Returns the visited handles in walk order.
    fn check_links(&self, root: Handle) -> Result<Vec<Handle>> {
        let mut order = Vec::with_capacity(self.store.len());
        let mut stack: Vec<(Handle, Option<&[u8]>, Option<&[u8]>)> = vec![(root, None, None)];
        while let Some((handle, lower, upper)) = stack.pop() {
            if order.len() == self.store.len() {
                return Err(IndexError::Invariant("cycle in child links"));
            }
            order.push(handle);
            let node = self.store.get(handle)?;
            let key = node.key();
            if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
                return Err(IndexError::Invariant("key order violated"));
            }
            for (child, bounds) in [
                (node.right(), (Some(key), upper)),
                (node.left(), (lower, Some(key))),
            ] {
                let Some(child) = child else {
                    continue;
                };
                let child_node = self.store.get(child)?;
                if child_node.parent() != Some(handle) {
                    return Err(IndexError::Invariant("broken parent link"));
                }
                if node.is_changed() && child_node.is_changed() {
                    return Err(IndexError::Invariant("adjacent unsettled nodes"));
                }
                stack.push((child, bounds.0, bounds.1));
            }
        }
        Ok(order)
    }

    /// Children follow their parent in `order`, so walking it backwards
    /// settles every subtree height before its parent needs it.
    fn check_settled_heights(&self, order: &[Handle]) -> Result<()> {
        let mut settled = vec![0usize; self.store.len()];
        for &handle in order.iter().rev() {
            let node = self.store.get(handle)?;
            let left = node.left().map_or(0, |c| settled[c.index()]);
            let right = node.right().map_or(0, |c| settled[c.index()]);
            if left != right {
                return Err(IndexError::Invariant("unequal settled height"));
            }
            settled[handle.index()] = left + usize::from(!node.is_changed());
        }
        Ok(())
    }
}
