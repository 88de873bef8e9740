//! Containment graph model for the managed inventory.
//!
//! Nodes live in an index-addressed arena and may have several parents, so
//! converging containment paths (a host reachable through more than one
//! container) are representable without owning references. One [`Hierarchy`]
//! is built per datacenter.

mod hierarchy;
mod node;

pub use hierarchy::{Hierarchy, TreeError};
pub use node::{Arena, Bfs, Dfs, IdAllocator, Node, NodeId};
