//! Core types for the dependency graph.
//!
//! The four per-layer entities (screens, GraphQL operations, resolver
//! bindings, RPC methods) and the uniform node/edge shape they are flattened
//! into for the persisted document.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;

use super::index::GraphIndex;
use crate::config::Config;
use crate::error::Warning;

/// Version tag written into every graph document.
pub const GRAPH_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Query,
    Mutation,
    Field,
}

impl ResolverKind {
    /// Whether a resolver of this kind can implement an operation of `kind`.
    pub fn implements(self, kind: OperationKind) -> bool {
        matches!(
            (self, kind),
            (ResolverKind::Query, OperationKind::Query)
                | (ResolverKind::Mutation, OperationKind::Mutation)
        )
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverKind::Query => write!(f, "query"),
            ResolverKind::Mutation => write!(f, "mutation"),
            ResolverKind::Field => write!(f, "field"),
        }
    }
}

/// Which routing convention produced a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingStyle {
    /// Directory-tree routes: `app/<segments>/page.tsx`.
    #[serde(rename = "app-router")]
    AppRouter,
    /// File-tree routes: `pages/<path>.tsx`.
    #[serde(rename = "pages-router")]
    PagesRouter,
}

impl fmt::Display for RoutingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingStyle::AppRouter => write!(f, "app-router"),
            RoutingStyle::PagesRouter => write!(f, "pages-router"),
        }
    }
}

/// A navigable UI route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: String,
    pub route: String,
    pub source_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub routing_style: RoutingStyle,
}

/// A GraphQL query/mutation/subscription discovered in documents or code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLOperation {
    pub id: String,
    pub operation_kind: OperationKind,
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub source_file: PathBuf,
    pub raw_text: String,
}

/// A backend method implementing one GraphQL field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverBinding {
    pub id: String,
    pub owner_name: String,
    pub method_name: String,
    pub kind: ResolverKind,
    pub exposed_name: String,
    pub source_file: PathBuf,
    /// Candidate RPC ids inferred from the method body.
    pub outbound_calls: Vec<String>,
}

/// One `rpc` declaration of a service in an interface-definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcMethod {
    pub id: String,
    pub service_name: String,
    pub method_name: String,
    pub package_name: String,
    pub input_type: String,
    pub output_type: String,
    pub source_file: PathBuf,
}

/// The kind of a node in the persisted graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "screen")]
    Screen,
    #[serde(rename = "gqlField")]
    GqlField,
    #[serde(rename = "resolver")]
    Resolver,
    #[serde(rename = "grpc")]
    Grpc,
}

impl NodeType {
    /// Layer order, consumer first.
    pub const ALL: [NodeType; 4] = [
        NodeType::Screen,
        NodeType::GqlField,
        NodeType::Resolver,
        NodeType::Grpc,
    ];

    /// Layer name used by view selections (`screen`, `graphql`, `resolver`, `grpc`).
    pub fn layer(self) -> &'static str {
        match self {
            NodeType::Screen => "screen",
            NodeType::GqlField => "graphql",
            NodeType::Resolver => "resolver",
            NodeType::Grpc => "grpc",
        }
    }

    pub fn is_api(self) -> bool {
        matches!(self, NodeType::GqlField | NodeType::Grpc)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Screen => write!(f, "screen"),
            NodeType::GqlField => write!(f, "gqlField"),
            NodeType::Resolver => write!(f, "resolver"),
            NodeType::Grpc => write!(f, "grpc"),
        }
    }
}

/// The kind of an edge. Edges point from consumer to provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Screen -> GraphQL operation.
    Uses,
    /// GraphQL operation -> resolver.
    Resolves,
    /// Resolver -> RPC method.
    Calls,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Uses => write!(f, "uses"),
            EdgeKind::Resolves => write!(f, "resolves"),
            EdgeKind::Calls => write!(f, "calls"),
        }
    }
}

/// Uniform node shape for traversal and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    pub group: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl GraphNode {
    pub fn file(&self) -> Option<&str> {
        self.meta.get("file").and_then(Value::as_str)
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl From<&Screen> for GraphNode {
    fn from(screen: &Screen) -> Self {
        Self {
            id: screen.id.clone(),
            node_type: NodeType::Screen,
            label: screen.route.clone(),
            group: "screens".to_string(),
            meta: object(json!({
                "file": screen.source_file,
                "namespace": screen.namespace,
                "type": screen.routing_style,
            })),
        }
    }
}

impl From<&GraphQLOperation> for GraphNode {
    fn from(op: &GraphQLOperation) -> Self {
        Self {
            id: op.id.clone(),
            node_type: NodeType::GqlField,
            label: format!("{}.{}", op.operation_kind, op.field_name),
            group: "graphql".to_string(),
            meta: object(json!({
                "operationName": op.operation_name,
                "file": op.source_file,
            })),
        }
    }
}

impl From<&ResolverBinding> for GraphNode {
    fn from(resolver: &ResolverBinding) -> Self {
        Self {
            id: resolver.id.clone(),
            node_type: NodeType::Resolver,
            label: format!("{}.{}", resolver.owner_name, resolver.method_name),
            group: "bff".to_string(),
            meta: object(json!({
                "file": resolver.source_file,
                "graphqlName": resolver.exposed_name,
                "type": resolver.kind,
            })),
        }
    }
}

impl From<&RpcMethod> for GraphNode {
    fn from(method: &RpcMethod) -> Self {
        Self {
            id: method.id.clone(),
            node_type: NodeType::Grpc,
            label: format!("{}.{}", method.service_name, method.method_name),
            group: "grpc".to_string(),
            meta: object(json!({
                "file": method.source_file,
                "package": method.package_name,
                "inputType": method.input_type,
                "outputType": method.output_type,
            })),
        }
    }
}

/// A directed edge, consumer -> provider. `id` is a build-time sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMeta {
    #[serde(default)]
    pub warnings: Vec<Warning>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
}

/// The persisted dependency graph. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub version: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub index: GraphIndex,
    pub meta: GraphMeta,
}

impl DependencyGraph {
    /// A structurally valid graph with no nodes, carrying `warnings`.
    pub fn empty(warnings: Vec<Warning>, config: Option<Config>) -> Self {
        Self {
            version: GRAPH_VERSION.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            index: GraphIndex::default(),
            meta: GraphMeta {
                warnings,
                timestamp: chrono::Utc::now().to_rfc3339(),
                config,
            },
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of(&self, node_type: NodeType) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Recompute the index from the current nodes and edges.
    pub fn rebuild_index(&mut self) {
        self.index = GraphIndex::build(&self.nodes, &self.edges);
    }

    pub fn stats(&self) -> GraphStats {
        let count = |t| self.nodes_of(t).count();
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            screens: count(NodeType::Screen),
            operations: count(NodeType::GqlField),
            resolvers: count(NodeType::Resolver),
            rpc_methods: count(NodeType::Grpc),
            warnings: self.meta.warnings.len(),
        }
    }
}

/// Summary counts of a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub screens: usize,
    pub operations: usize,
    pub resolvers: usize,
    pub rpc_methods: usize,
    pub warnings: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Edges: {}", self.edges)?;
        writeln!(f, "  Screens: {}", self.screens)?;
        writeln!(f, "  GraphQL Fields: {}", self.operations)?;
        writeln!(f, "  Resolvers: {}", self.resolvers)?;
        write!(f, "  gRPC Methods: {}", self.rpc_methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_serde_names() {
        assert_eq!(serde_json::to_string(&NodeType::GqlField).unwrap(), "\"gqlField\"");
        assert_eq!(serde_json::to_string(&EdgeKind::Resolves).unwrap(), "\"resolves\"");
        assert_eq!(
            serde_json::to_string(&RoutingStyle::PagesRouter).unwrap(),
            "\"pages-router\""
        );
    }

    #[test]
    fn test_resolver_kind_implements() {
        assert!(ResolverKind::Query.implements(OperationKind::Query));
        assert!(ResolverKind::Mutation.implements(OperationKind::Mutation));
        assert!(!ResolverKind::Query.implements(OperationKind::Mutation));
        assert!(!ResolverKind::Field.implements(OperationKind::Query));
        assert!(!ResolverKind::Query.implements(OperationKind::Subscription));
    }

    #[test]
    fn test_screen_node_shape() {
        let screen = Screen {
            id: "screen:/products/[id]".into(),
            route: "/products/[id]".into(),
            source_file: PathBuf::from("apps/web/app/products/[id]/page.tsx"),
            namespace: None,
            routing_style: RoutingStyle::AppRouter,
        };
        let node = GraphNode::from(&screen);
        assert_eq!(node.node_type, NodeType::Screen);
        assert_eq!(node.label, "/products/[id]");
        assert_eq!(node.group, "screens");
        assert_eq!(node.file(), Some("apps/web/app/products/[id]/page.tsx"));
        assert_eq!(node.meta["type"], "app-router");
    }

    #[test]
    fn test_rpc_node_label() {
        let method = RpcMethod {
            id: "grpc:UserService.GetUser".into(),
            service_name: "UserService".into(),
            method_name: "GetUser".into(),
            package_name: "user.v1".into(),
            input_type: "GetUserRequest".into(),
            output_type: "User".into(),
            source_file: PathBuf::from("protos/user.proto"),
        };
        let node = GraphNode::from(&method);
        assert_eq!(node.label, "UserService.GetUser");
        assert_eq!(node.meta["package"], "user.v1");
    }

    #[test]
    fn test_empty_graph_is_valid_document() {
        let graph = DependencyGraph::empty(vec![Warning::new("Analysis failed: x")], None);
        let value = serde_json::to_value(&graph).unwrap();
        for key in ["version", "nodes", "edges", "index", "meta"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert!(value["meta"].get("config").is_none());
        assert_eq!(graph.stats().warnings, 1);
    }
}
