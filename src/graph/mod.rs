//! Dependency graph: data model, edge inference, index and traversal.

pub mod builder;
pub mod engine;
pub mod index;
pub mod matcher;
pub mod persistence;
pub mod types;

pub use builder::{GraphBuilder, Layers};
pub use engine::{GraphView, MAX_CHAIN_HOPS};
pub use index::{route_group_key, GraphIndex};
pub use matcher::{ExactMatcher, MatchOutcome, MatcherChain, RpcMatcher, ServiceSubstringMatcher};
pub use types::{
    DependencyGraph, EdgeKind, GraphEdge, GraphMeta, GraphNode, GraphQLOperation, GraphStats,
    NodeType, OperationKind, ResolverBinding, ResolverKind, RoutingStyle, RpcMethod, Screen,
    GRAPH_VERSION,
};
