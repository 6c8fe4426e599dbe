//! Impact lookup: which screens depend on an API, and how.

use serde::Serialize;

use super::filter::ScreenFilter;
use crate::graph::{DependencyGraph, GraphView};

/// Screens affected by a change to one API node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub api: String,
    pub screens: Vec<ImpactedScreen>,
    /// Indexed screens not listed: rejected by the filter or absent from the nodes.
    pub filtered_out: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedScreen {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Node ids from the screen along first outgoing edges toward the API.
    pub path: Vec<String>,
}

impl ImpactReport {
    /// Screens indexed against `api`, narrowed by `filter`. Index entries
    /// with no matching node are skipped.
    pub fn compute(graph: &DependencyGraph, api: &str, filter: Option<&ScreenFilter>) -> Self {
        let view = GraphView::new(graph);
        let indexed = graph.index.screens_for(api);

        let screens: Vec<ImpactedScreen> = indexed
            .iter()
            .filter_map(|id| view.node(id))
            .filter(|node| filter.map_or(true, |f| f.matches_label(&node.label)))
            .map(|node| ImpactedScreen {
                id: node.id.clone(),
                label: node.label.clone(),
                file: node.file().map(str::to_string),
                path: view
                    .chain(&node.id, api)
                    .iter()
                    .map(|n| n.id.clone())
                    .collect(),
            })
            .collect();

        Self {
            api: api.to_string(),
            filtered_out: indexed.len() - screens.len(),
            screens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty() && self.filtered_out == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, GraphEdge, GraphNode, NodeType};
    use serde_json::{json, Map};

    fn node(id: &str, node_type: NodeType, label: &str) -> GraphNode {
        let mut meta = Map::new();
        if node_type == NodeType::Screen {
            meta.insert("file".into(), json!(format!("apps/web/app{}/page.tsx", label)));
        }
        GraphNode {
            id: id.into(),
            node_type,
            label: label.into(),
            group: String::new(),
            meta,
        }
    }

    fn graph() -> DependencyGraph {
        let mut graph = DependencyGraph::empty(Vec::new(), None);
        graph.nodes = vec![
            node("screen:/products", NodeType::Screen, "/products"),
            node("screen:/products/[id]", NodeType::Screen, "/products/[id]"),
            node("screen:/home", NodeType::Screen, "/home"),
            node("gql:query.product", NodeType::GqlField, "query.product"),
            node("resolver:P.product", NodeType::Resolver, "P.product"),
            node("grpc:ProductService.Get", NodeType::Grpc, "ProductService.Get"),
        ];
        let edges = [
            ("screen:/products", "gql:query.product", EdgeKind::Uses),
            ("screen:/products/[id]", "gql:query.product", EdgeKind::Uses),
            ("screen:/home", "gql:query.product", EdgeKind::Uses),
            ("gql:query.product", "resolver:P.product", EdgeKind::Resolves),
            ("resolver:P.product", "grpc:ProductService.Get", EdgeKind::Calls),
        ];
        graph.edges = edges
            .iter()
            .enumerate()
            .map(|(i, (from, to, kind))| GraphEdge {
                id: format!("e{}", i + 1),
                from: from.to_string(),
                to: to.to_string(),
                kind: *kind,
            })
            .collect();
        graph.rebuild_index();
        graph
    }

    #[test]
    fn test_impacted_screens_with_paths() {
        let g = graph();
        let report = ImpactReport::compute(&g, "gql:query.product", None);
        assert_eq!(report.screens.len(), 3);
        assert_eq!(report.filtered_out, 0);
        assert_eq!(
            report.screens[0].path,
            vec!["screen:/products", "gql:query.product"]
        );
        assert_eq!(
            report.screens[0].file.as_deref(),
            Some("apps/web/app/products/page.tsx")
        );
    }

    #[test]
    fn test_filter_counts_dropped_screens() {
        let g = graph();
        let filter = ScreenFilter::new("/products*").unwrap();
        let report = ImpactReport::compute(&g, "gql:query.product", Some(&filter));
        let ids: Vec<&str> = report.screens.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["screen:/products", "screen:/products/[id]"]);
        assert_eq!(report.filtered_out, 1);
    }

    #[test]
    fn test_unknown_api_is_empty() {
        let g = graph();
        assert!(ImpactReport::compute(&g, "gql:query.nothing", None).is_empty());
        // RPC nodes are only indexed when a screen uses them directly.
        assert!(ImpactReport::compute(&g, "grpc:ProductService.Get", None).is_empty());
    }
}
