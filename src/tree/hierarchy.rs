use crate::tree::node::{Arena, Node, NodeId};
use thiserror::Error;

/// Errors raised when building a hierarchy.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("root node has {0} parent(s), a hierarchy root must have none")]
    InvalidRoot(usize),
}

/// One containment tree, owning its node arena and a validated root.
///
/// The node list is exactly the set reachable from the root by child edges,
/// in breadth-first discovery order; the leaf list is its zero-children
/// subset in the same relative order. BFS order is canonical because
/// distance-from-root and spanning-tree parents are only meaningful under
/// it, and because shallowest-first leaf discovery keeps reports
/// deterministic.
///
/// Traversal mutates per-node bookkeeping in place, so traversals over one
/// hierarchy must not interleave (single-writer discipline).
#[derive(Debug)]
pub struct Hierarchy<V> {
    arena: Arena<V>,
    root: usize,
    order: Vec<usize>,
    leaves: Vec<usize>,
}

impl<V> Hierarchy<V> {
    /// Validate the root and derive the node and leaf lists.
    pub fn build(arena: Arena<V>, root: usize) -> Result<Self, TreeError> {
        let parent_count = arena.node(root).parents.len();
        if parent_count > 0 {
            return Err(TreeError::InvalidRoot(parent_count));
        }
        let mut hierarchy = Self { arena, root, order: Vec::new(), leaves: Vec::new() };
        hierarchy.refresh(None);
        Ok(hierarchy)
    }

    /// Re-derive the node and leaf lists, optionally from a different start
    /// node.
    ///
    /// Every known node's visited flag is reset before traversing, and all
    /// flags are false again when this returns, so repeated refreshes see
    /// no stale traversal state.
    pub fn refresh(&mut self, root: Option<usize>) {
        let start = root.unwrap_or(self.root);
        self.arena.reset_visited();
        self.order = self.arena.bfs(start).collect();
        self.leaves =
            self.order.iter().copied().filter(|&idx| self.arena.node(idx).is_leaf()).collect();
        self.arena.reset_visited();
    }

    pub fn root(&self) -> &Node<V> {
        self.arena.node(self.root)
    }

    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reachable nodes in BFS discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<V>> {
        self.order.iter().map(|&idx| self.arena.node(idx))
    }

    /// Leaf nodes, in the same relative order as [`Hierarchy::nodes`].
    pub fn leaves(&self) -> impl Iterator<Item = &Node<V>> {
        self.leaves.iter().map(|&idx| self.arena.node(idx))
    }

    /// Linear scan of the node list. Absence is `None`, never an error.
    pub fn find_by_id(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes().find(|node| node.id == id)
    }

    /// Depth-first visit order from the root, as arena indices. Alternate
    /// traversal only; BFS order stays canonical for the node and leaf
    /// lists.
    pub fn dfs_order(&mut self) -> Vec<usize> {
        self.arena.reset_visited();
        let order: Vec<usize> = self.arena.dfs(self.root).collect();
        self.arena.reset_visited();
        order
    }

    pub fn arena(&self) -> &Arena<V> {
        &self.arena
    }
}
