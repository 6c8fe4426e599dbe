//! Reverse-lookup tables over a finished graph.
//!
//! Always rebuilt from scratch from `nodes` and `edges`; never patched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::types::{GraphEdge, GraphNode, NodeType};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphIndex {
    /// API node id (GraphQL operation or RPC method) -> screens using it directly.
    #[serde(default)]
    pub api_to_screens: BTreeMap<String, Vec<String>>,
    /// Screen id -> APIs it uses directly.
    #[serde(default)]
    pub screen_to_apis: BTreeMap<String, Vec<String>>,
    /// `screen:/<first segment>/*` -> screen ids under that segment.
    #[serde(default)]
    pub route_groups: BTreeMap<String, Vec<String>>,
}

impl GraphIndex {
    pub fn build(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        let types: HashMap<&str, NodeType> = nodes
            .iter()
            .map(|n| (n.id.as_str(), n.node_type))
            .collect();

        let mut index = GraphIndex::default();
        for edge in edges {
            let (Some(&from), Some(&to)) = (types.get(edge.from.as_str()), types.get(edge.to.as_str()))
            else {
                continue;
            };
            if from != NodeType::Screen || !to.is_api() {
                continue;
            }
            push_unique(
                index.api_to_screens.entry(edge.to.clone()).or_default(),
                &edge.from,
            );
            push_unique(
                index.screen_to_apis.entry(edge.from.clone()).or_default(),
                &edge.to,
            );
        }

        for node in nodes.iter().filter(|n| n.node_type == NodeType::Screen) {
            if let Some(key) = route_group_key(&node.label) {
                index.route_groups.entry(key).or_default().push(node.id.clone());
            }
        }
        index
    }

    pub fn screens_for(&self, api_id: &str) -> &[String] {
        self.api_to_screens
            .get(api_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn apis_for(&self, screen_id: &str) -> &[String] {
        self.screen_to_apis
            .get(screen_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// `screen:/<first segment>/*` for a route; `None` for the root route.
pub fn route_group_key(route: &str) -> Option<String> {
    let first = route.split('/').find(|s| !s.is_empty())?;
    Some(format!("screen:/{}/*", first))
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
