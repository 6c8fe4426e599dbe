//! Graph builder: runs the four extractors and infers edges between layers.
//!
//! Extraction is guarded per layer (and per sub-project), so a crashing
//! extractor costs one warning instead of the whole graph. Edges are then
//! inferred in three passes, always in this order:
//!
//! 1. screen -> GraphQL operation (`uses`), from a re-scan of the screen file
//! 2. GraphQL operation -> resolver (`resolves`), on `(kind, name)` equality
//! 3. resolver -> RPC method (`calls`), through the [`MatcherChain`]
//!
//! Edges whose endpoints are not in the final node set are dropped before
//! ids are assigned.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info, warn};

use super::matcher::{MatchOutcome, MatcherChain};
use super::types::{
    DependencyGraph, EdgeKind, GraphEdge, GraphMeta, GraphNode, GraphQLOperation,
    ResolverBinding, RpcMethod, Screen, GRAPH_VERSION,
};
use super::index::GraphIndex;
use crate::config::{Config, ProjectKind};
use crate::error::{panic_message, Warning};
use crate::extract::{
    discover_dependencies, extract_operations, extract_resolvers, extract_rpc_methods,
    extract_screens, files_under, guard_layer, LayerOutput, LayerResult,
};
use crate::scanner::SourceFile;

/// Raw per-layer extraction results, before edge inference.
#[derive(Debug)]
pub struct Layers {
    pub screens: LayerResult<Screen>,
    pub operations: LayerResult<GraphQLOperation>,
    pub resolvers: LayerResult<ResolverBinding>,
    pub rpc_methods: LayerResult<RpcMethod>,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            screens: Ok(LayerOutput::default()),
            operations: Ok(LayerOutput::default()),
            resolvers: Ok(LayerOutput::default()),
            rpc_methods: Ok(LayerOutput::default()),
        }
    }
}

/// Builds a [`DependencyGraph`] from scanned files.
#[derive(Debug)]
pub struct GraphBuilder<'c> {
    config: &'c Config,
    matchers: MatcherChain,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            matchers: MatcherChain::default(),
        }
    }

    /// Replace the RPC matching strategy.
    pub fn with_matchers(mut self, matchers: MatcherChain) -> Self {
        self.matchers = matchers;
        self
    }

    /// Extract every layer and assemble the graph. Never fails: a panic
    /// escaping the layer guards yields an empty graph with one warning.
    pub fn build(&self, files: &[SourceFile]) -> DependencyGraph {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let layers = self.extract(files);
            self.assemble(layers, files)
        }));
        match outcome {
            Ok(graph) => graph,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(error = %message, "analysis failed");
                DependencyGraph::empty(
                    vec![Warning::new(format!("Analysis failed: {}", message))],
                    self.echoed_config(),
                )
            }
        }
    }

    /// Run the four extractors, each under its own guard.
    pub fn extract(&self, files: &[SourceFile]) -> Layers {
        let screens = guard_layer("screen", || {
            let mut output = LayerOutput::default();
            for (name, project) in self
                .config
                .projects()
                .filter(|(_, p)| p.kind == ProjectKind::Nextjs)
            {
                match guard_layer(name, || extract_screens(project, files)) {
                    Ok(found) => output.extend(found),
                    Err(e) => {
                        warn!(app = name, error = %e, "app analysis failed");
                        output.warnings.push(Warning::new(format!(
                            "Failed to analyze app {}: {}",
                            name,
                            e.message()
                        )));
                    }
                }
            }
            Ok(output)
        });

        let operations = guard_layer("GraphQL", || {
            extract_operations(files, &self.config.analysis.graphql)
        });

        let resolvers = guard_layer("resolver", || {
            let mut output = LayerOutput::default();
            for (name, project) in self
                .config
                .projects()
                .filter(|(_, p)| p.kind == ProjectKind::Nestjs)
            {
                let scoped = files_under(files, &project.path);
                match guard_layer(name, || extract_resolvers(scoped, &self.config.analysis.nestjs)) {
                    Ok(found) => output.extend(found),
                    Err(e) => {
                        warn!(package = name, error = %e, "package analysis failed");
                        output.warnings.push(Warning::new(format!(
                            "Failed to analyze package {}: {}",
                            name,
                            e.message()
                        )));
                    }
                }
            }
            Ok(output)
        });

        let rpc_methods = guard_layer("gRPC", || {
            extract_rpc_methods(files_under(files, &self.config.protos.path))
        });

        Layers {
            screens,
            operations,
            resolvers,
            rpc_methods,
        }
    }

    /// Turn extracted layers into nodes, edges, index and metadata.
    pub fn assemble(&self, layers: Layers, files: &[SourceFile]) -> DependencyGraph {
        let mut warnings = Vec::new();
        let screens = dedupe_by_id(settle(layers.screens, &mut warnings), |s| &s.id);
        let operations = dedupe_by_id(settle(layers.operations, &mut warnings), |o| &o.id);
        let resolvers = dedupe_by_id(settle(layers.resolvers, &mut warnings), |r| &r.id);
        let rpc_methods = dedupe_by_id(settle(layers.rpc_methods, &mut warnings), |m| &m.id);

        info!(
            screens = screens.len(),
            operations = operations.len(),
            resolvers = resolvers.len(),
            rpc_methods = rpc_methods.len(),
            "extracted layers"
        );

        let mut nodes: Vec<GraphNode> = Vec::with_capacity(
            screens.len() + operations.len() + resolvers.len() + rpc_methods.len(),
        );
        nodes.extend(screens.iter().map(GraphNode::from));
        nodes.extend(operations.iter().map(GraphNode::from));
        nodes.extend(resolvers.iter().map(GraphNode::from));
        nodes.extend(rpc_methods.iter().map(GraphNode::from));

        let mut pending = Vec::new();
        self.screen_uses(&screens, files, &mut pending, &mut warnings);
        operation_resolves(&operations, &resolvers, &mut pending, &mut warnings);
        self.resolver_calls(&resolvers, &rpc_methods, &mut pending, &mut warnings);

        let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let before = pending.len();
        let edges: Vec<GraphEdge> = pending
            .into_iter()
            .filter(|(from, to, _)| known.contains(from.as_str()) && known.contains(to.as_str()))
            .enumerate()
            .map(|(i, (from, to, kind))| GraphEdge {
                id: format!("e{}", i + 1),
                from,
                to,
                kind,
            })
            .collect();
        if edges.len() < before {
            debug!(dropped = before - edges.len(), "dropped edges to unknown nodes");
        }

        let index = GraphIndex::build(&nodes, &edges);
        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            warnings = warnings.len(),
            "graph built"
        );

        DependencyGraph {
            version: GRAPH_VERSION.to_string(),
            nodes,
            edges,
            index,
            meta: GraphMeta {
                warnings,
                timestamp: chrono::Utc::now().to_rfc3339(),
                config: self.echoed_config(),
            },
        }
    }

    fn echoed_config(&self) -> Option<Config> {
        (!self.config.output.anonymize).then(|| self.config.clone())
    }

    /// Pass 1. Every discovered id becomes an edge; unknown targets are
    /// dropped later with the other dangling edges.
    fn screen_uses(
        &self,
        screens: &[Screen],
        files: &[SourceFile],
        edges: &mut Vec<PendingEdge>,
        warnings: &mut Vec<Warning>,
    ) {
        let graphql = &self.config.analysis.graphql;
        screen_uses_with(screens, files, edges, warnings, |file| {
            discover_dependencies(file, graphql)
        });
    }

    /// Pass 3.
    fn resolver_calls(
        &self,
        resolvers: &[ResolverBinding],
        methods: &[RpcMethod],
        edges: &mut Vec<PendingEdge>,
        warnings: &mut Vec<Warning>,
    ) {
        for resolver in resolvers {
            for candidate in &resolver.outbound_calls {
                match self.matchers.resolve(candidate, methods) {
                    MatchOutcome::Exact(method) => {
                        edges.push((resolver.id.clone(), method.id.clone(), EdgeKind::Calls));
                    }
                    MatchOutcome::Fuzzy { method, matcher } => {
                        debug!(candidate = %candidate, method = %method.id, matcher, "fuzzy RPC match");
                        warnings.push(Warning::new(format!(
                            "Fuzzy matched {} to {}",
                            candidate, method.id
                        )));
                        edges.push((resolver.id.clone(), method.id.clone(), EdgeKind::Calls));
                    }
                    MatchOutcome::Unmatched => {
                        warnings.push(Warning::new(format!(
                            "No gRPC service found for dependency: {}",
                            candidate
                        )));
                    }
                }
            }
        }
    }
}

type PendingEdge = (String, String, EdgeKind);

/// Discovery runs under its own guard per screen; a failure costs that
/// screen's edges and nothing else.
fn screen_uses_with(
    screens: &[Screen],
    files: &[SourceFile],
    edges: &mut Vec<PendingEdge>,
    warnings: &mut Vec<Warning>,
    discover: impl Fn(&SourceFile) -> Vec<String>,
) {
    let by_path: HashMap<&Path, &SourceFile> =
        files.iter().map(|f| (f.path.as_path(), f)).collect();
    for screen in screens {
        let Some(file) = by_path.get(screen.source_file.as_path()) else {
            continue;
        };
        let discovered = guard_layer(&screen.id, || {
            Ok(LayerOutput {
                entities: discover(*file),
                warnings: Vec::new(),
            })
        });
        match discovered {
            Ok(found) => {
                for dependency in found.entities {
                    edges.push((screen.id.clone(), dependency, EdgeKind::Uses));
                }
            }
            Err(e) => {
                warn!(screen = %screen.id, error = %e, "screen dependency discovery failed");
                warnings.push(Warning::new(format!(
                    "Failed to analyze screen dependencies for {}: {}",
                    screen.id,
                    e.message()
                )));
            }
        }
    }
}

/// Pass 2. First resolver with the same kind and exposed name wins.
fn operation_resolves(
    operations: &[GraphQLOperation],
    resolvers: &[ResolverBinding],
    edges: &mut Vec<PendingEdge>,
    warnings: &mut Vec<Warning>,
) {
    for operation in operations {
        let resolver = resolvers.iter().find(|r| {
            r.kind.implements(operation.operation_kind) && r.exposed_name == operation.field_name
        });
        match resolver {
            Some(resolver) => {
                edges.push((operation.id.clone(), resolver.id.clone(), EdgeKind::Resolves));
            }
            None => warnings.push(Warning::new(format!(
                "No resolver found for GraphQL field: {}",
                operation.id
            ))),
        }
    }
}

/// Entities of a layer, its warnings appended to `warnings`. A failed
/// layer contributes its error as a warning and no entities.
fn settle<T>(result: LayerResult<T>, warnings: &mut Vec<Warning>) -> Vec<T> {
    match result {
        Ok(output) => {
            warnings.extend(output.warnings);
            output.entities
        }
        Err(e) => {
            warn!(error = %e, "layer failed");
            warnings.push(e.into());
            Vec::new()
        }
    }
}

/// First entity per id wins.
fn dedupe_by_id<T>(entities: Vec<T>, id: impl Fn(&T) -> &String) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(entities.len());
    for entity in entities {
        if seen.insert(id(&entity).clone()) {
            kept.push(entity);
        } else {
            debug!(id = %id(&entity), "duplicate entity id, keeping first");
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::graph::types::{OperationKind, ResolverKind, RoutingStyle};
    use std::path::PathBuf;

    fn screen(route: &str, file: &str) -> Screen {
        Screen {
            id: format!("screen:{}", route),
            route: route.into(),
            source_file: PathBuf::from(file),
            namespace: None,
            routing_style: RoutingStyle::AppRouter,
        }
    }

    fn operation(kind: OperationKind, field: &str) -> GraphQLOperation {
        GraphQLOperation {
            id: format!("gql:{}.{}", kind, field),
            operation_kind: kind,
            field_name: field.into(),
            operation_name: None,
            source_file: PathBuf::from("ops.graphql"),
            raw_text: String::new(),
        }
    }

    fn resolver(method: &str, kind: ResolverKind, calls: &[&str]) -> ResolverBinding {
        ResolverBinding {
            id: format!("resolver:UserResolver.{}", method),
            owner_name: "UserResolver".into(),
            method_name: method.into(),
            kind,
            exposed_name: method.into(),
            source_file: PathBuf::from("user.resolver.ts"),
            outbound_calls: calls.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn rpc(service: &str, method: &str) -> RpcMethod {
        RpcMethod {
            id: format!("grpc:{}.{}", service, method),
            service_name: service.into(),
            method_name: method.into(),
            package_name: String::new(),
            input_type: String::new(),
            output_type: String::new(),
            source_file: PathBuf::from("user.proto"),
        }
    }

    fn layers() -> Layers {
        Layers {
            screens: Ok(LayerOutput {
                entities: vec![screen("/profile", "app/profile/page.tsx")],
                warnings: vec![],
            }),
            operations: Ok(LayerOutput {
                entities: vec![
                    operation(OperationKind::Query, "user"),
                    operation(OperationKind::Mutation, "missing"),
                ],
                warnings: vec![Warning::new("Failed to parse GraphQL in bad.graphql: x")],
            }),
            resolvers: Ok(LayerOutput {
                entities: vec![resolver(
                    "user",
                    ResolverKind::Query,
                    &["grpc:UserService.GetUser", "grpc:OrderService.CreateOrder", "grpc:Nope.X"],
                )],
                warnings: vec![],
            }),
            rpc_methods: Ok(LayerOutput {
                entities: vec![rpc("UserService", "GetUser"), rpc("orderservice", "create")],
                warnings: vec![],
            }),
        }
    }

    fn screen_file() -> SourceFile {
        SourceFile::parsed(
            "app/profile/page.tsx",
            "export default function P() { useQuery(user); useQuery(Unknown); return null; }\n",
        )
    }

    #[test]
    fn test_edges_in_pass_order() {
        let config = Config::default();
        let graph = GraphBuilder::new(&config).assemble(layers(), &[screen_file()]);

        let edges: Vec<(&str, &str, EdgeKind)> = graph
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.kind))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("screen:/profile", "gql:query.user", EdgeKind::Uses),
                ("gql:query.user", "resolver:UserResolver.user", EdgeKind::Resolves),
                ("resolver:UserResolver.user", "grpc:UserService.GetUser", EdgeKind::Calls),
                ("resolver:UserResolver.user", "grpc:orderservice.create", EdgeKind::Calls),
            ]
        );
        let ids: Vec<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn test_warnings_layer_first_then_edges() {
        let config = Config::default();
        let graph = GraphBuilder::new(&config).assemble(layers(), &[screen_file()]);
        let warnings: Vec<&str> = graph.meta.warnings.iter().map(Warning::as_str).collect();
        assert_eq!(
            warnings,
            vec![
                "Failed to parse GraphQL in bad.graphql: x",
                "No resolver found for GraphQL field: gql:mutation.missing",
                "Fuzzy matched grpc:OrderService.CreateOrder to grpc:orderservice.create",
                "No gRPC service found for dependency: grpc:Nope.X",
            ]
        );
    }

    #[test]
    fn test_failed_screen_discovery_keeps_other_screens() {
        let screens = vec![
            screen("/profile", "app/profile/page.tsx"),
            screen("/broken", "app/broken/page.tsx"),
        ];
        let files = vec![
            screen_file(),
            SourceFile::new("app/broken/page.tsx", "export default 1"),
        ];
        let mut edges = Vec::new();
        let mut warnings = Vec::new();
        screen_uses_with(&screens, &files, &mut edges, &mut warnings, |file| {
            if file.path.ends_with("broken/page.tsx") {
                panic!("unexpected syntax");
            }
            vec!["gql:query.user".to_string()]
        });

        assert_eq!(
            edges,
            vec![(
                "screen:/profile".to_string(),
                "gql:query.user".to_string(),
                EdgeKind::Uses
            )]
        );
        let warnings: Vec<&str> = warnings.iter().map(Warning::as_str).collect();
        assert_eq!(
            warnings,
            vec!["Failed to analyze screen dependencies for screen:/broken: unexpected syntax"]
        );
    }

    #[test]
    fn test_no_dangling_edges() {
        let config = Config::default();
        let graph = GraphBuilder::new(&config).assemble(layers(), &[screen_file()]);
        for edge in &graph.edges {
            assert!(graph.node(&edge.from).is_some());
            assert!(graph.node(&edge.to).is_some());
        }
        assert!(graph.edges.iter().all(|e| e.to != "gql:query.Unknown"));
    }

    #[test]
    fn test_failed_rpc_layer_keeps_other_layers() {
        let config = Config::default();
        let mut input = layers();
        input.rpc_methods = Err(ExtractError::layer("gRPC", "bad proto"));
        let graph = GraphBuilder::new(&config).assemble(input, &[screen_file()]);

        let stats = graph.stats();
        assert_eq!(stats.screens, 1);
        assert_eq!(stats.operations, 2);
        assert_eq!(stats.resolvers, 1);
        assert_eq!(stats.rpc_methods, 0);
        assert_eq!(graph.edges_of(EdgeKind::Calls).count(), 0);
        assert_eq!(
            graph
                .meta
                .warnings
                .iter()
                .filter(|w| w.as_str().contains("bad proto"))
                .count(),
            1
        );
    }

    #[test]
    fn test_strict_matchers_skip_fuzzy() {
        let config = Config::default();
        let graph = GraphBuilder::new(&config)
            .with_matchers(MatcherChain::strict())
            .assemble(layers(), &[screen_file()]);
        assert_eq!(graph.edges_of(EdgeKind::Calls).count(), 1);
        assert!(graph
            .meta
            .warnings
            .iter()
            .all(|w| !w.as_str().starts_with("Fuzzy matched")));
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let config = Config::default();
        let mut first = operation(OperationKind::Query, "user");
        first.source_file = PathBuf::from("a.graphql");
        let mut second = operation(OperationKind::Query, "user");
        second.source_file = PathBuf::from("b.graphql");
        let input = Layers {
            operations: Ok(LayerOutput {
                entities: vec![first, second],
                warnings: vec![],
            }),
            ..Layers::default()
        };
        let graph = GraphBuilder::new(&config).assemble(input, &[]);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].file(), Some("a.graphql"));
    }

    #[test]
    fn test_anonymize_omits_config() {
        let mut config = Config::default();
        assert!(GraphBuilder::new(&config)
            .assemble(Layers::default(), &[])
            .meta
            .config
            .is_some());
        config.output.anonymize = true;
        assert!(GraphBuilder::new(&config)
            .assemble(Layers::default(), &[])
            .meta
            .config
            .is_none());
    }

    #[test]
    fn test_index_built_from_edges() {
        let config = Config::default();
        let graph = GraphBuilder::new(&config).assemble(layers(), &[screen_file()]);
        assert_eq!(graph.index.screens_for("gql:query.user"), &["screen:/profile"]);
    }
}
