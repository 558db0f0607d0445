//! Generic directed graph infrastructure.
//!
//! The inheritance graph behind [`crate::analysis::database::SubtypeGraph`] is built on these
//! types: one node per class, one edge per `extends` / `implements` relation pointing from the
//! subtype to the supertype.
//!
//! # Key Components
//!
//! - [`NodeId`] / [`EdgeId`] - Strongly-typed indices
//! - [`DirectedGraph`] - Adjacency-list graph with node and edge payloads
//! - [`algorithms`] - Depth-first traversal in both directions
//! - [`GraphBase`], [`Successors`], [`Predecessors`] - Traits the algorithms are written against
//!
//! # Thread Safety
//!
//! All types are [`Send`] and [`Sync`] when their payloads are. The graph itself has no interior
//! mutability; shared mutation goes through the owner's lock.

mod directed;
mod node;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use node::{EdgeId, NodeId};
pub use traits::{GraphBase, Predecessors, Successors};
