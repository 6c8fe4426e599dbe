//! Node and edge differences between two graph documents, by id.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::filter::ScreenFilter;
use crate::graph::{DependencyGraph, GraphEdge, GraphNode};

/// Added/removed nodes and edges. Node lists honour the screen filter;
/// edge lists and the summary never do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDiff {
    pub added_nodes: Vec<GraphNode>,
    pub removed_nodes: Vec<GraphNode>,
    pub added_edges: Vec<GraphEdge>,
    pub removed_edges: Vec<GraphEdge>,
    pub summary: DiffSummary,
}

/// Unfiltered change counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub edges_added: usize,
    pub edges_removed: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.nodes_added + self.nodes_removed + self.edges_added + self.edges_removed
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Total changes: {}", self.total())?;
        writeln!(f, "  Node changes: +{} -{}", self.nodes_added, self.nodes_removed)?;
        write!(f, "  Edge changes: +{} -{}", self.edges_added, self.edges_removed)
    }
}

impl GraphDiff {
    pub fn compute(old: &DependencyGraph, new: &DependencyGraph, filter: Option<&ScreenFilter>) -> Self {
        let added_nodes = missing_from(&new.nodes, &old.nodes, |n| &n.id);
        let removed_nodes = missing_from(&old.nodes, &new.nodes, |n| &n.id);
        let added_edges = missing_from(&new.edges, &old.edges, |e| &e.id);
        let removed_edges = missing_from(&old.edges, &new.edges, |e| &e.id);

        let summary = DiffSummary {
            nodes_added: added_nodes.len(),
            nodes_removed: removed_nodes.len(),
            edges_added: added_edges.len(),
            edges_removed: removed_edges.len(),
        };

        let keep = |nodes: Vec<GraphNode>| -> Vec<GraphNode> {
            match filter {
                Some(filter) => nodes.into_iter().filter(|n| filter.accepts(n)).collect(),
                None => nodes,
            }
        };

        Self {
            added_nodes: keep(added_nodes),
            removed_nodes: keep(removed_nodes),
            added_edges,
            removed_edges,
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total() == 0
    }
}

/// Items of `items` whose id does not occur in `other`, in `items` order.
fn missing_from<T: Clone>(items: &[T], other: &[T], id: impl Fn(&T) -> &String) -> Vec<T> {
    let present: HashSet<&str> = other.iter().map(|item| id(item).as_str()).collect();
    items
        .iter()
        .filter(|item| !present.contains(id(*item).as_str()))
        .cloned()
        .collect()
}
