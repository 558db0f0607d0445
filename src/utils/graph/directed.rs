//! Adjacency-list directed graph.
//!
//! [`DirectedGraph`] stores node and edge payloads in vectors and keeps per-node lists of
//! outgoing and incoming edges, so both directions of traversal are O(degree). Nodes and edges
//! are never removed; a graph that has to be rebuilt is simply replaced.

use crate::{
    utils::graph::{
        node::{EdgeId, NodeId},
        traits::{GraphBase, Predecessors, Successors},
    },
    Error, Result,
};

#[derive(Debug, Clone)]
struct EdgeData<E> {
    source: NodeId,
    target: NodeId,
    data: E,
}

/// A directed multigraph with node payload `N` and edge payload `E`.
///
/// # Examples
///
/// ```rust,ignore
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let object = graph.add_node("java/lang/Object");
/// let string = graph.add_node("java/lang/String");
/// graph.add_edge(string, object, ())?;
/// assert_eq!(graph.successors(string).collect::<Vec<_>>(), vec![object]);
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    nodes: Vec<N>,
    edges: Vec<EdgeData<E>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates an empty graph
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Adds a node and returns its id
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Payload of `node`
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Mutable payload of `node`
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index())
    }

    /// Number of nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterator over `(id, payload)` pairs in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, data)| (NodeId::new(i), data))
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// # Errors
    /// Returns [`Error::GraphError`] if either endpoint does not exist.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        if source.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "source node {} does not exist in graph with {} nodes",
                source,
                self.nodes.len()
            )));
        }
        if target.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "target node {} does not exist in graph with {} nodes",
                target,
                self.nodes.len()
            )));
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(EdgeData {
            source,
            target,
            data,
        });
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);

        Ok(id)
    }

    /// Payload of `edge`
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edges.get(edge.index()).map(|e| &e.data)
    }

    /// `(source, target)` of `edge`
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(edge.index()).map(|e| (e.source, e.target))
    }

    /// Number of edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of `node` with their target and payload
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.outgoing
            .get(node.index())
            .into_iter()
            .flatten()
            .map(|&edge_id| {
                let edge = &self.edges[edge_id.index()];
                (edge.target, &edge.data)
            })
    }

    /// Incoming edges of `node` with their source and payload
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.incoming
            .get(node.index())
            .into_iter()
            .flatten()
            .map(|&edge_id| {
                let edge = &self.edges[edge_id.index()];
                (edge.source, &edge.data)
            })
    }

    /// Returns `true` if the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `node` belongs to this graph
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }
}

impl<N, E> GraphBase for DirectedGraph<N, E> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

impl<N, E> Successors for DirectedGraph<N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.outgoing
            .get(node.index())
            .into_iter()
            .flatten()
            .map(|&edge_id| self.edges[edge_id.index()].target)
    }
}

impl<N, E> Predecessors for DirectedGraph<N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.incoming
            .get(node.index())
            .into_iter()
            .flatten()
            .map(|&edge_id| self.edges[edge_id.index()].source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (DirectedGraph<&'static str, u8>, [NodeId; 4]) {
        let mut graph = DirectedGraph::new();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        let d = graph.add_node("D");
        graph.add_edge(a, b, 1).unwrap();
        graph.add_edge(a, c, 2).unwrap();
        graph.add_edge(b, d, 3).unwrap();
        graph.add_edge(c, d, 4).unwrap();
        (graph, [a, b, c, d])
    }

    #[test]
    fn new_graph_is_empty() {
        let graph: DirectedGraph<(), ()> = DirectedGraph::default();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn adjacency_both_directions() {
        let (graph, [a, b, c, d]) = diamond();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(graph.predecessors(d).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(graph.successors(d).count(), 0);

        let labels: Vec<u8> = graph.outgoing_edges(a).map(|(_, e)| *e).collect();
        assert_eq!(labels, vec![1, 2]);
        let sources: Vec<NodeId> = graph.incoming_edges(d).map(|(n, _)| n).collect();
        assert_eq!(sources, vec![b, c]);
    }

    #[test]
    fn node_payload_access() {
        let (mut graph, [a, ..]) = diamond();
        assert_eq!(graph.node(a), Some(&"A"));
        *graph.node_mut(a).unwrap() = "Z";
        assert_eq!(graph.node(a), Some(&"Z"));
        assert_eq!(graph.node(NodeId::new(99)), None);
        assert!(!graph.contains_node(NodeId::new(4)));
    }

    #[test]
    fn edge_to_missing_node_fails() {
        let (mut graph, [a, ..]) = diamond();
        let result = graph.add_edge(a, NodeId::new(10), 0);
        assert!(matches!(result, Err(Error::GraphError(_))));

        let edge = graph.add_edge(a, a, 9).unwrap();
        assert_eq!(graph.edge(edge), Some(&9));
        assert_eq!(graph.edge_endpoints(edge), Some((a, a)));
    }
}
