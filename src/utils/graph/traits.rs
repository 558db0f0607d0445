//! Trait definitions for graph abstractions.
//!
//! Traversal algorithms are written against these traits rather than a concrete graph, so the
//! same DFS walks the inheritance graph upwards (successors: supertypes) and downwards
//! (predecessors: subtypes).
//!
//! - [`GraphBase`] - Node count and node iteration
//! - [`Successors`] - Outgoing adjacency
//! - [`Predecessors`] - Incoming adjacency

use crate::utils::graph::NodeId;

/// Core properties every graph exposes.
pub trait GraphBase {
    /// Number of nodes in the graph
    fn node_count(&self) -> usize;

    /// All node ids, in index order
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;
}

/// Forward traversal along outgoing edges.
pub trait Successors: GraphBase {
    /// Direct successors of `node`
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Backward traversal along incoming edges.
pub trait Predecessors: GraphBase {
    /// Direct predecessors of `node`
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}
