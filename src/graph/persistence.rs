//! JSON persistence of the dependency graph document.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::types::DependencyGraph;
use crate::error::{Result, ScreenLinkError};

impl DependencyGraph {
    /// Write the graph as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScreenLinkError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ScreenLinkError::json(path, e))?;
        fs::write(path, json).map_err(|e| ScreenLinkError::io(path, e))?;
        info!(
            path = %path.display(),
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScreenLinkError::io(path, e))?;
        let graph: DependencyGraph =
            serde_json::from_str(&content).map_err(|e| ScreenLinkError::json(path, e))?;
        debug!(path = %path.display(), nodes = graph.nodes.len(), "graph loaded");
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;
    use crate::graph::types::{EdgeKind, GraphEdge, GraphNode, NodeType};
    use serde_json::Map;
    use tempfile::TempDir;

    fn sample() -> DependencyGraph {
        let mut graph = DependencyGraph::empty(vec![Warning::new("one")], None);
        graph.nodes = vec![
            GraphNode {
                id: "screen:/cart".into(),
                node_type: NodeType::Screen,
                label: "/cart".into(),
                group: "screens".into(),
                meta: Map::new(),
            },
            GraphNode {
                id: "gql:query.cart".into(),
                node_type: NodeType::GqlField,
                label: "query.cart".into(),
                group: "graphql".into(),
                meta: Map::new(),
            },
        ];
        graph.edges = vec![GraphEdge {
            id: "e1".into(),
            from: "screen:/cart".into(),
            to: "gql:query.cart".into(),
            kind: EdgeKind::Uses,
        }];
        graph.rebuild_index();
        graph
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("map.json");
        let graph = sample();
        graph.save(&path).unwrap();

        let loaded = DependencyGraph::load(&path).unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_document_top_level_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.json");
        sample().save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["version", "nodes", "edges", "index", "meta"] {
            assert!(keys.contains(&key), "missing {}", key);
        }
        assert_eq!(raw["nodes"][1]["type"], "gqlField");
        assert_eq!(raw["index"]["apiToScreens"]["gql:query.cart"][0], "screen:/cart");
        assert!(raw["meta"].get("config").is_none());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            DependencyGraph::load(&missing),
            Err(ScreenLinkError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            DependencyGraph::load(&broken),
            Err(ScreenLinkError::Json { .. })
        ));
    }
}
