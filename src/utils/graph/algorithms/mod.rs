//! Algorithms over [`crate::utils::graph::DirectedGraph`] and the graph traits.

mod traversal;

pub use traversal::{dfs, reverse_dfs, DfsIterator};
