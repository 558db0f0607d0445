//! Generic building blocks that are not specific to JVM metadata.
//!
//! - [`graph`] - Directed graph with depth-first traversal, backing the inheritance graph

pub mod graph;
