//! Traversal engine over a built dependency graph.
//!
//! Loads the persisted node/edge lists into a petgraph `DiGraph` so queries
//! can run on any graph document, without the extractors.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use super::types::{DependencyGraph, EdgeKind, GraphNode};

/// Safety bound on [`GraphView::chain`].
pub const MAX_CHAIN_HOPS: usize = 10;

/// Read-only petgraph view of a [`DependencyGraph`].
pub struct GraphView<'g> {
    graph: DiGraph<&'g GraphNode, EdgeKind>,
    /// Index: node id -> node index.
    id_index: HashMap<&'g str, NodeIndex>,
    /// First outgoing edge target of each node, in edge-list order.
    first_out: HashMap<NodeIndex, NodeIndex>,
}

impl<'g> GraphView<'g> {
    pub fn new(source: &'g DependencyGraph) -> Self {
        let mut graph = DiGraph::with_capacity(source.nodes.len(), source.edges.len());
        let mut id_index = HashMap::with_capacity(source.nodes.len());
        for node in &source.nodes {
            // First node wins on duplicate ids.
            id_index
                .entry(node.id.as_str())
                .or_insert_with(|| graph.add_node(node));
        }

        let mut first_out = HashMap::new();
        let mut skipped = 0usize;
        for edge in &source.edges {
            let (Some(&from), Some(&to)) = (
                id_index.get(edge.from.as_str()),
                id_index.get(edge.to.as_str()),
            ) else {
                skipped += 1;
                continue;
            };
            graph.add_edge(from, to, edge.kind);
            first_out.entry(from).or_insert(to);
        }
        if skipped > 0 {
            debug!(skipped, "ignored edges with unknown endpoints");
        }

        Self {
            graph,
            id_index,
            first_out,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'g GraphNode> {
        self.id_index.get(id).map(|&idx| self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Ids reachable from `seeds` within `hops` steps, edges taken in either
    /// direction. Seeds are included at distance 0; unknown seeds are ignored.
    pub fn reachable<'a>(
        &self,
        seeds: impl IntoIterator<Item = &'a str>,
        hops: usize,
    ) -> HashSet<&'g str> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();

        for seed in seeds {
            if let Some(&idx) = self.id_index.get(seed) {
                if visited.insert(idx) {
                    queue.push_back((idx, 0));
                }
            }
        }

        while let Some((idx, depth)) = queue.pop_front() {
            if depth >= hops {
                continue;
            }
            let outgoing = self.graph.edges(idx).map(|e| e.target());
            let incoming = self
                .graph
                .edges_directed(idx, petgraph::Direction::Incoming)
                .map(|e| e.source());
            for next in outgoing.chain(incoming) {
                if visited.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        visited
            .into_iter()
            .map(|idx| {
                let node: &'g GraphNode = self.graph[idx];
                node.id.as_str()
            })
            .collect()
    }

    /// Follow the first outgoing edge from `start` until `target` is reached,
    /// a node has no outgoing edge, or [`MAX_CHAIN_HOPS`] hops were taken.
    /// The returned path starts with `start`; empty if `start` is unknown.
    pub fn chain(&self, start: &str, target: &str) -> Vec<&'g GraphNode> {
        let Some(&start_idx) = self.id_index.get(start) else {
            return Vec::new();
        };
        let mut current = start_idx;
        let mut path = vec![self.graph[current]];
        while self.graph[current].id != target && path.len() <= MAX_CHAIN_HOPS {
            let Some(&next) = self.first_out.get(&current) else {
                break;
            };
            path.push(self.graph[next]);
            current = next;
        }
        path
    }

    /// Direct providers of `id`, in edge-list order.
    pub fn dependencies(&self, id: &str) -> Vec<(&'g GraphNode, EdgeKind)> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut deps: Vec<_> = self
            .graph
            .edges(idx)
            .map(|e| (e.id(), self.graph[e.target()], *e.weight()))
            .collect();
        deps.sort_by_key(|(edge, _, _)| *edge);
        deps.into_iter().map(|(_, node, kind)| (node, kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{GraphEdge, GraphMeta, NodeType};
    use crate::graph::GraphIndex;
    use serde_json::Map;

    fn graph(nodes: &[(&str, NodeType)], edges: &[(&str, &str, EdgeKind)]) -> DependencyGraph {
        DependencyGraph {
            version: "1.0".into(),
            nodes: nodes
                .iter()
                .map(|(id, t)| GraphNode {
                    id: id.to_string(),
                    node_type: *t,
                    label: id.to_string(),
                    group: String::new(),
                    meta: Map::new(),
                })
                .collect(),
            edges: edges
                .iter()
                .enumerate()
                .map(|(i, (from, to, kind))| GraphEdge {
                    id: format!("e{}", i + 1),
                    from: from.to_string(),
                    to: to.to_string(),
                    kind: *kind,
                })
                .collect(),
            index: GraphIndex::default(),
            meta: GraphMeta::default(),
        }
    }

    fn sample() -> DependencyGraph {
        graph(
            &[
                ("screen:/a", NodeType::Screen),
                ("screen:/b", NodeType::Screen),
                ("gql:query.a", NodeType::GqlField),
                ("resolver:R.a", NodeType::Resolver),
                ("grpc:S.A", NodeType::Grpc),
            ],
            &[
                ("screen:/a", "gql:query.a", EdgeKind::Uses),
                ("screen:/b", "gql:query.a", EdgeKind::Uses),
                ("gql:query.a", "resolver:R.a", EdgeKind::Resolves),
                ("resolver:R.a", "grpc:S.A", EdgeKind::Calls),
                ("resolver:R.a", "grpc:Missing.X", EdgeKind::Calls),
            ],
        )
    }

    #[test]
    fn test_view_skips_dangling_edges() {
        let g = sample();
        let view = GraphView::new(&g);
        assert_eq!(view.node_count(), 5);
        assert_eq!(view.edge_count(), 4);
    }

    #[test]
    fn test_reachable_is_bounded_and_undirected() {
        let g = sample();
        let view = GraphView::new(&g);

        let zero = view.reachable(["screen:/a"], 0);
        assert_eq!(zero, HashSet::from(["screen:/a"]));

        let one = view.reachable(["screen:/a"], 1);
        assert_eq!(one, HashSet::from(["screen:/a", "gql:query.a"]));

        // Undirected: the sibling screen is reached back through the operation.
        let two = view.reachable(["screen:/a"], 2);
        assert_eq!(
            two,
            HashSet::from(["screen:/a", "gql:query.a", "screen:/b", "resolver:R.a"])
        );

        assert!(view.reachable(["nope"], 5).is_empty());
    }

    #[test]
    fn test_reachable_handles_cycles() {
        let g = graph(
            &[("a", NodeType::Resolver), ("b", NodeType::Resolver)],
            &[("a", "b", EdgeKind::Calls), ("b", "a", EdgeKind::Calls)],
        );
        let view = GraphView::new(&g);
        assert_eq!(view.reachable(["a"], 100).len(), 2);
    }

    #[test]
    fn test_chain_follows_first_outgoing_edge() {
        let g = sample();
        let view = GraphView::new(&g);
        let path: Vec<&str> = view
            .chain("screen:/b", "grpc:S.A")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(
            path,
            vec!["screen:/b", "gql:query.a", "resolver:R.a", "grpc:S.A"]
        );

        // Stops at the target.
        let path = view.chain("screen:/a", "gql:query.a");
        assert_eq!(path.len(), 2);
        assert!(view.chain("unknown", "x").is_empty());
    }

    #[test]
    fn test_chain_bounded_on_cycles() {
        let g = graph(
            &[("a", NodeType::Resolver), ("b", NodeType::Resolver)],
            &[("a", "b", EdgeKind::Calls), ("b", "a", EdgeKind::Calls)],
        );
        let view = GraphView::new(&g);
        assert_eq!(view.chain("a", "never").len(), MAX_CHAIN_HOPS + 1);
    }

    #[test]
    fn test_dependencies_in_edge_order() {
        let g = sample();
        let view = GraphView::new(&g);
        let deps: Vec<&str> = view
            .dependencies("resolver:R.a")
            .iter()
            .map(|(n, _)| n.id.as_str())
            .collect();
        assert_eq!(deps, vec!["grpc:S.A"]);
    }
}
