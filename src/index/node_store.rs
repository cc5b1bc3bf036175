#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::types::{Handle, IndexError, Payload, Result};

/// A single arena row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    key: Box<[u8]>,
    payload: Payload,
    left: Handle,
    right: Handle,
    parent: Handle,
    changed: bool,
}

impl Node {
    /// Token bytes stored in this node.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Size/pointer pair attached to the token.
    pub fn payload(&self) -> Payload {
        self.payload
    }

    /// Left child, if any.
    pub fn left(&self) -> Option<Handle> {
        self.left.get()
    }

    /// Right child, if any.
    pub fn right(&self) -> Option<Handle> {
        self.right.get()
    }

    /// Parent link, `None` for the root.
    pub fn parent(&self) -> Option<Handle> {
        self.parent.get()
    }

    /// Whether the node is still unsettled by the insertion fixup.
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Contiguous node arena addressed by [`Handle`].
///
/// Rows are never removed, so a handle stays valid for the lifetime of the
/// store. The root link lives alongside the rows so that a serialized store
/// is self-contained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStore {
    nodes: Vec<Node>,
    root: Handle,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty arena with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: Handle::NIL,
        }
    }

    /// Number of rows in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node was ever pushed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current root, `None` for an empty tree.
    pub fn root(&self) -> Option<Handle> {
        self.root.get()
    }

    /// Checked accessor; fails on the sentinel or an out-of-range handle.
    pub fn get(&self, handle: Handle) -> Result<&Node> {
        self.nodes
            .get(handle.index())
            .ok_or(IndexError::InvalidHandle(handle))
    }

    /// Appends a new unsettled leaf below `parent` and returns its handle.
    ///
    /// The caller is responsible for linking the leaf into the parent's
    /// child slot.
    pub(crate) fn push(
        &mut self,
        key: &[u8],
        payload: Payload,
        parent: Option<Handle>,
    ) -> Result<Handle> {
        let raw = u32::try_from(self.nodes.len())
            .ok()
            .filter(|raw| *raw != Handle::NIL.0)
            .ok_or(IndexError::Invalid("node arena exhausted"))?;
        self.nodes.push(Node {
            key: key.into(),
            payload,
            left: Handle::NIL,
            right: Handle::NIL,
            parent: parent.into(),
            changed: true,
        });
        Ok(Handle(raw))
    }

    // Unchecked accessors used on hot paths. Handles reaching these come from
    // the tree's own links; a bad one is a bug and panics.

    #[inline]
    fn node(&self, handle: Handle) -> &Node {
        debug_assert!(!handle.is_nil(), "dereferenced nil handle");
        &self.nodes[handle.index()]
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node {
        debug_assert!(!handle.is_nil(), "dereferenced nil handle");
        &mut self.nodes[handle.index()]
    }

    #[inline]
    pub(crate) fn key(&self, handle: Handle) -> &[u8] {
        &self.node(handle).key
    }

    #[inline]
    pub(crate) fn payload(&self, handle: Handle) -> Payload {
        self.node(handle).payload
    }

    #[inline]
    pub(crate) fn left(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).left.get()
    }

    #[inline]
    pub(crate) fn right(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).right.get()
    }

    #[inline]
    pub(crate) fn parent(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).parent.get()
    }

    #[inline]
    pub(crate) fn is_changed(&self, handle: Handle) -> bool {
        self.node(handle).changed
    }

    pub(crate) fn set_root(&mut self, root: Option<Handle>) {
        self.root = root.into();
    }

    pub(crate) fn set_payload(&mut self, handle: Handle, payload: Payload) {
        self.node_mut(handle).payload = payload;
    }

    pub(crate) fn set_left(&mut self, handle: Handle, child: Option<Handle>) {
        self.node_mut(handle).left = child.into();
    }

    pub(crate) fn set_right(&mut self, handle: Handle, child: Option<Handle>) {
        self.node_mut(handle).right = child.into();
    }

    pub(crate) fn set_parent(&mut self, handle: Handle, parent: Option<Handle>) {
        self.node_mut(handle).parent = parent.into();
    }

    pub(crate) fn set_changed(&mut self, handle: Handle, changed: bool) {
        self.node_mut(handle).changed = changed;
    }
}
