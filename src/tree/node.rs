use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Identity of a node, unique across every tree built from one allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing node ids, starting at 1.
///
/// Owned by whichever component constructs hierarchies; ids stay unique for
/// as long as a single allocator is threaded through every tree build.
#[derive(Debug)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Restart numbering at 1. Meant for test fixture construction only;
    /// resetting while trees built from this allocator are still alive
    /// breaks id uniqueness.
    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// One inventory object placed in the containment graph.
#[derive(Debug)]
pub struct Node<V> {
    pub id: NodeId,
    pub value: V,
    /// Arena indices of structural parents. Empty for a root.
    pub parents: Vec<usize>,
    /// Arena indices of children. Empty for a leaf.
    pub children: Vec<usize>,
    /// Index of the node this one was first discovered from during the
    /// last traversal, distinct from the structural parents above.
    pub span_parent: Option<usize>,
    /// Edge count from the traversal start. Set by BFS only.
    pub distance: u32,
    pub(crate) visited: bool,
}

impl<V> Node<V> {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Index-addressed node storage.
///
/// Parent/child edges are plain index lists; the arena does not enforce
/// bidirectional consistency, the builder wires both sides.
#[derive(Debug, Default)]
pub struct Arena<V> {
    nodes: Vec<Node<V>>,
}

impl<V> Arena<V> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Insert a node with the given edges as-is and return its index.
    pub fn create_node(
        &mut self,
        ids: &mut IdAllocator,
        parents: Vec<usize>,
        value: V,
        children: Vec<usize>,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            id: ids.allocate(),
            value,
            parents,
            children,
            span_parent: None,
            distance: 0,
            visited: false,
        });
        idx
    }

    /// Append `child` to `parent`'s child list. The reverse edge is
    /// supplied at `create_node` time.
    pub fn add_child(&mut self, parent: usize, child: usize) {
        self.nodes[parent].children.push(child);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &Node<V> {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        &mut self.nodes[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node<V>> {
        self.nodes.iter()
    }

    pub(crate) fn reset_visited(&mut self) {
        for node in &mut self.nodes {
            node.visited = false;
        }
    }

    /// Breadth-first traversal from `start`, yielding arena indices in
    /// discovery order.
    ///
    /// One-shot: visited flags stay set after the iterator is exhausted and
    /// must be reset before the same nodes are traversed again. A node
    /// reachable along more than one path is yielded exactly once, with its
    /// spanning-tree parent set to the first node it was dequeued from.
    pub fn bfs(&mut self, start: usize) -> Bfs<'_, V> {
        let node = &mut self.nodes[start];
        node.visited = true;
        node.span_parent = None;
        node.distance = 0;
        Bfs { nodes: &mut self.nodes, queue: VecDeque::from([start]) }
    }

    /// Depth-first traversal from `start` with the same visited-marking
    /// discipline as [`Arena::bfs`], driven by a stack. Spanning-tree
    /// parents are recorded; distances are not.
    pub fn dfs(&mut self, start: usize) -> Dfs<'_, V> {
        let node = &mut self.nodes[start];
        node.visited = true;
        node.span_parent = None;
        Dfs { nodes: &mut self.nodes, stack: vec![start] }
    }
}

pub struct Bfs<'a, V> {
    nodes: &'a mut Vec<Node<V>>,
    queue: VecDeque<usize>,
}

impl<V> Iterator for Bfs<'_, V> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.queue.pop_front()?;
        let distance = self.nodes[current].distance;
        let children = self.nodes[current].children.clone();
        for child_idx in children {
            let child = &mut self.nodes[child_idx];
            if !child.visited {
                child.visited = true;
                child.span_parent = Some(current);
                child.distance = distance + 1;
                self.queue.push_back(child_idx);
            }
        }
        Some(current)
    }
}

pub struct Dfs<'a, V> {
    nodes: &'a mut Vec<Node<V>>,
    stack: Vec<usize>,
}

impl<V> Iterator for Dfs<'_, V> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.stack.pop()?;
        let children = self.nodes[current].children.clone();
        for child_idx in children {
            let child = &mut self.nodes[child_idx];
            if !child.visited {
                child.visited = true;
                child.span_parent = Some(current);
                self.stack.push(child_idx);
            }
        }
        Some(current)
    }
}
