//! Command-line surface for screen-link.
//!
//! Commands:
//! - analyze: scan the repository and write the graph document
//! - view: print a filtered subgraph
//! - impact: screens affected by an API change
//! - diff: compare two graph documents

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::query::DEFAULT_LAYERS;

/// Default graph document path.
pub const DEFAULT_MAP: &str = "map.json";

#[derive(Parser, Debug)]
#[command(name = "screen-link")]
#[command(about = "Dependency visualization for monorepos: screens, GraphQL, resolvers, gRPC")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze dependencies and write the graph document
    Analyze {
        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path
        #[arg(short, long, default_value = DEFAULT_MAP)]
        output: PathBuf,

        /// Debug logging and the full warning list
        #[arg(long)]
        verbose: bool,
    },

    /// View dependencies with filters
    View {
        /// Screen filter pattern (`*` and `?` wildcards)
        #[arg(short, long)]
        filter: Option<String>,

        /// Comma-separated layers to show
        #[arg(short, long, default_value = DEFAULT_LAYERS)]
        layers: String,

        /// Hop limit from the selected screens
        #[arg(long)]
        hops: Option<usize>,

        /// Input graph document
        #[arg(short, long, default_value = DEFAULT_MAP)]
        input: PathBuf,
    },

    /// Show the screens impacted by an API change
    Impact {
        /// API node id (e.g. "gql:mutation.createOrder")
        api: String,

        /// Additional screen filter
        #[arg(short, long)]
        filter: Option<String>,

        /// Input graph document
        #[arg(short, long, default_value = DEFAULT_MAP)]
        input: PathBuf,
    },

    /// Compare two graph documents
    Diff {
        /// Old graph document
        old: PathBuf,

        /// New graph document
        new: PathBuf,

        /// Screen filter pattern
        #[arg(short, long)]
        filter: Option<String>,
    },
}

impl Commands {
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Analyze { verbose: true, .. })
    }
}
