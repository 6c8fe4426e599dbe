//! # screen-link
//!
//! Static cross-layer API dependency graphs for monorepos.
//!
//! screen-link reads a repository without running it and links four layers:
//! front-end screens (routes), the GraphQL operations they issue, the
//! backend resolvers implementing those operations, and the gRPC methods the
//! resolvers call. The result is a single JSON document that answers "which
//! screens break if this API changes?".
//!
//! ## Layers and edges
//!
//! - `screen --uses--> gqlField`
//! - `gqlField --resolves--> resolver`
//! - `resolver --calls--> grpc` (exact match, then a fuzzy fallback)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use screenlink::{analyze, Config, ImpactReport};
//!
//! let config = Config::load(None)?;
//! let graph = analyze(&config);
//! graph.save(std::path::Path::new("map.json"))?;
//!
//! let report = ImpactReport::compute(&graph, "gql:mutation.createOrder", None);
//! for screen in &report.screens {
//!     println!("{}", screen.label);
//! }
//! # Ok::<(), screenlink::ScreenLinkError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod ids;
pub mod parser;
pub mod query;
pub mod scanner;
pub mod syntax;

use std::time::Instant;
use tracing::{info, warn};

// Re-exports for convenience
pub use config::{Config, ProjectConfig, ProjectKind, RoutingMode};
pub use error::{ExtractError, Result, ScreenLinkError, Warning};

// Graph re-exports
pub use graph::{
    DependencyGraph, EdgeKind, GraphBuilder, GraphEdge, GraphIndex, GraphNode, GraphStats,
    GraphView, MatcherChain, NodeType, RpcMatcher,
};
pub use query::{select, GraphDiff, ImpactReport, ScreenFilter, ViewOptions};
pub use scanner::{scan, SourceFile, SourceKind};

/// Scan, parse and build the dependency graph for `config`.
///
/// Never fails: unreadable inputs and broken layers become warnings, and a
/// scan that cannot start yields an empty graph carrying the reason.
pub fn analyze(config: &Config) -> DependencyGraph {
    let start = Instant::now();
    let scanned = match scanner::scan(config) {
        Ok(scanned) => scanned,
        Err(e) => {
            warn!(error = %e, "scan failed");
            let echoed = (!config.output.anonymize).then(|| config.clone());
            return DependencyGraph::empty(
                vec![Warning::new(format!("Analysis failed: {}", e))],
                echoed,
            );
        }
    };

    let mut files = scanned.files;
    parser::attach_syntax(&mut files);

    let mut graph = GraphBuilder::new(config).build(&files);
    if !scanned.warnings.is_empty() {
        let mut warnings = scanned.warnings;
        warnings.append(&mut graph.meta.warnings);
        graph.meta.warnings = warnings;
    }

    info!(
        files = files.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );
    graph
}
