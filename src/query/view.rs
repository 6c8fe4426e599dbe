//! Subgraph selection for display.

use std::collections::HashSet;
use tracing::warn;

use super::filter::ScreenFilter;
use crate::graph::{DependencyGraph, GraphEdge, GraphNode, GraphView, NodeType};

/// Layers shown when none are named.
pub const DEFAULT_LAYERS: &str = "screen,graphql,resolver,grpc";

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub filter: Option<ScreenFilter>,
    /// Selected layer names (`screen`, `graphql`, `resolver`, `grpc`).
    pub layers: Vec<String>,
    /// Keep only nodes within this many hops of the selected screens.
    pub hops: Option<usize>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            filter: None,
            layers: parse_layers(DEFAULT_LAYERS),
            hops: None,
        }
    }
}

/// Split a comma-separated layer list. Unknown names are dropped with a
/// warning.
pub fn parse_layers(list: &str) -> Vec<String> {
    let known: Vec<&str> = NodeType::ALL.iter().map(|t| t.layer()).collect();
    list.split(',')
        .map(str::trim)
        .filter(|layer| !layer.is_empty())
        .filter(|layer| {
            let ok = known.contains(layer);
            if !ok {
                warn!(layer = *layer, "ignoring unknown layer");
            }
            ok
        })
        .map(str::to_string)
        .collect()
}

/// Selected nodes and the edges between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'g> {
    pub nodes: Vec<&'g GraphNode>,
    pub edges: Vec<&'g GraphEdge>,
}

impl<'g> Selection<'g> {
    /// Nodes grouped by layer, in layer order; empty layers omitted.
    pub fn by_layer(&self) -> Vec<(&'static str, Vec<&'g GraphNode>)> {
        NodeType::ALL
            .iter()
            .filter_map(|&t| {
                let nodes: Vec<&GraphNode> = self
                    .nodes
                    .iter()
                    .copied()
                    .filter(|n| n.node_type == t)
                    .collect();
                (!nodes.is_empty()).then_some((t.layer(), nodes))
            })
            .collect()
    }
}

/// Seeds are the screens passing the filter. With a hop limit only nodes
/// reachable from the seeds survive; screens must always pass the filter and
/// every node must belong to a selected layer.
pub fn select<'g>(graph: &'g DependencyGraph, options: &ViewOptions) -> Selection<'g> {
    let accepts = |node: &GraphNode| options.filter.as_ref().map_or(true, |f| f.accepts(node));

    let reachable: Option<HashSet<&'g str>> = options.hops.map(|hops| {
        let seeds = graph
            .nodes_of(NodeType::Screen)
            .filter(|n| accepts(*n))
            .map(|n| n.id.as_str());
        GraphView::new(graph).reachable(seeds, hops)
    });

    let nodes: Vec<&'g GraphNode> = graph
        .nodes
        .iter()
        .filter(|n| accepts(*n))
        .filter(|n| reachable.as_ref().map_or(true, |r| r.contains(n.id.as_str())))
        .filter(|n| options.layers.iter().any(|l| l == n.node_type.layer()))
        .collect();

    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges = graph
        .edges
        .iter()
        .filter(|e| kept.contains(e.from.as_str()) && kept.contains(e.to.as_str()))
        .collect();

    Selection { nodes, edges }
}
