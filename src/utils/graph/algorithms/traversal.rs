//! Graph traversal algorithms.
//!
//! - [`dfs`] - Iterative depth-first search along outgoing edges (pre-order)
//! - [`reverse_dfs`] - The same walk along incoming edges
//!
//! Both return lazy iterators, so a reachability query can stop at the first hit.

use crate::utils::graph::{GraphBase, NodeId, Predecessors, Successors};

/// Neighbour function deciding the traversal direction
type Step<G> = fn(&G, NodeId) -> Vec<NodeId>;

/// Depth-first search iterator.
///
/// Visits each node reachable from the start node exactly once, in pre-order.
pub struct DfsIterator<'g, G: GraphBase> {
    graph: &'g G,
    step: Step<G>,
    stack: Vec<NodeId>,
    visited: Vec<bool>,
}

impl<'g, G: GraphBase> DfsIterator<'g, G> {
    fn new(graph: &'g G, start: NodeId, step: Step<G>) -> Self {
        let node_count = graph.node_count();
        if start.index() >= node_count {
            return DfsIterator {
                graph,
                step,
                stack: Vec::new(),
                visited: Vec::new(),
            };
        }

        let mut visited = vec![false; node_count];
        visited[start.index()] = true;

        DfsIterator {
            graph,
            step,
            stack: vec![start],
            visited,
        }
    }
}

impl<G: GraphBase> Iterator for DfsIterator<'_, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        // Reverse push so neighbours come out in edge order
        let neighbours = (self.step)(self.graph, node);
        for &next in neighbours.iter().rev() {
            if !self.visited[next.index()] {
                self.visited[next.index()] = true;
                self.stack.push(next);
            }
        }

        Some(node)
    }
}

/// Returns a depth-first iterator along outgoing edges starting from `start`.
///
/// The start node is yielded first. An out-of-range start yields nothing.
///
/// # Complexity
///
/// - Time: O(V + E)
/// - Space: O(V)
///
/// # Examples
///
/// ```rust,ignore
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// graph.add_edge(a, b, ())?;
/// assert_eq!(dfs(&graph, a).collect::<Vec<_>>(), vec![a, b]);
/// ```
pub fn dfs<G: Successors>(graph: &G, start: NodeId) -> DfsIterator<'_, G> {
    DfsIterator::new(graph, start, |g, node| g.successors(node).collect())
}

/// Returns a depth-first iterator along incoming edges starting from `start`.
pub fn reverse_dfs<G: Predecessors>(graph: &G, start: NodeId) -> DfsIterator<'_, G> {
    DfsIterator::new(graph, start, |g, node| g.predecessors(node).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

    fn chain_with_branch() -> (DirectedGraph<char, ()>, Vec<NodeId>) {
        // A -> B -> D, A -> C
        let mut graph = DirectedGraph::new();
        let a = graph.add_node('A');
        let b = graph.add_node('B');
        let c = graph.add_node('C');
        let d = graph.add_node('D');
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(a, c, ()).unwrap();
        graph.add_edge(b, d, ()).unwrap();
        (graph, vec![a, b, c, d])
    }

    #[test]
    fn dfs_pre_order() {
        let (graph, n) = chain_with_branch();
        let order: Vec<NodeId> = dfs(&graph, n[0]).collect();
        assert_eq!(order, vec![n[0], n[1], n[3], n[2]]);
    }

    #[test]
    fn reverse_dfs_walks_incoming_edges() {
        let (graph, n) = chain_with_branch();
        let order: Vec<NodeId> = reverse_dfs(&graph, n[3]).collect();
        assert_eq!(order, vec![n[3], n[1], n[0]]);
    }

    #[test]
    fn dfs_handles_cycles_and_bad_start() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(b, a, ()).unwrap();

        assert_eq!(dfs(&graph, a).count(), 2);
        assert_eq!(dfs(&graph, NodeId::new(5)).count(), 0);
    }
}
