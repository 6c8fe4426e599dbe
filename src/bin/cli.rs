//! screen-link CLI - cross-layer API dependency graphs.
//!
//! Usage:
//!   screen-link analyze [-c config] [-o map.json] [--verbose]
//!   screen-link view [-f pattern] [-l layers] [--hops N] [-i map.json]
//!   screen-link impact <api> [-f pattern] [-i map.json]
//!   screen-link diff <old> <new> [-f pattern]

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use screenlink::cli::{Cli, Commands};
use screenlink::query::{parse_layers, select, GraphDiff, ImpactReport, ScreenFilter, ViewOptions};
use screenlink::{analyze, Config, DependencyGraph};

/// Paths printed per impact report.
const IMPACT_PATHS_SHOWN: usize = 3;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.command.verbose());

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            config,
            output,
            verbose,
        } => run_analyze(config.as_deref(), &output, verbose),
        Commands::View {
            filter,
            layers,
            hops,
            input,
        } => run_view(filter.as_deref(), &layers, hops, &input),
        Commands::Impact { api, filter, input } => run_impact(&api, filter.as_deref(), &input),
        Commands::Diff { old, new, filter } => run_diff(&old, &new, filter.as_deref()),
    }
}

fn load_graph(path: &Path) -> Result<DependencyGraph> {
    DependencyGraph::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn screen_filter(pattern: Option<&str>) -> Result<Option<ScreenFilter>> {
    pattern
        .map(ScreenFilter::new)
        .transpose()
        .context("invalid filter pattern")
}

fn run_analyze(config_path: Option<&Path>, output: &Path, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let errors = config.validate();
    if !errors.is_empty() {
        eprintln!("Configuration errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!("configuration validation failed");
    }
    if verbose {
        eprintln!("Using config: {}", serde_json::to_string_pretty(&config)?);
    }

    let graph = analyze(&config);
    graph.save(output)?;

    println!("Analysis complete! Output written to {}", output.display());
    println!();
    println!("Summary:");
    println!("{}", graph.stats());

    let warnings = &graph.meta.warnings;
    if !warnings.is_empty() {
        println!();
        println!("Warnings: {}", warnings.len());
        if verbose {
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    }
    Ok(())
}

fn run_view(filter: Option<&str>, layers: &str, hops: Option<usize>, input: &Path) -> Result<()> {
    let graph = load_graph(input)?;
    let options = ViewOptions {
        filter: screen_filter(filter)?,
        layers: parse_layers(layers),
        hops,
    };

    println!("Dependency View");
    println!("================");
    if let Some(pattern) = filter {
        println!("Filter: {}", pattern);
    }
    println!("Layers: {}", options.layers.join(", "));
    if let Some(hops) = hops {
        println!("Hops limit: {}", hops);
    }
    println!();

    let selection = select(&graph, &options);
    println!("Filtered Results:");
    println!("  Nodes: {}", selection.nodes.len());
    println!("  Edges: {}", selection.edges.len());
    println!();

    for (layer, nodes) in selection.by_layer() {
        println!("{}:", layer.to_uppercase());
        for node in nodes {
            println!("  {} - {}", node.id, node.label);
        }
        println!();
    }
    Ok(())
}

fn run_impact(api: &str, filter: Option<&str>, input: &Path) -> Result<()> {
    let graph = load_graph(input)?;
    let matcher = screen_filter(filter)?;

    println!("Impact Analysis");
    println!("===============");
    println!("API: {}", api);
    if let Some(pattern) = filter {
        println!("Additional filter: {}", pattern);
    }
    println!();

    let report = ImpactReport::compute(&graph, api, matcher.as_ref());
    if report.is_empty() {
        println!("No screens found that depend on this API");
        return Ok(());
    }

    println!("Impacted Screens ({}):", report.screens.len());
    for screen in &report.screens {
        println!("  {} ({})", screen.label, screen.id);
        if let Some(file) = &screen.file {
            println!("    File: {}", file);
        }
    }
    if report.filtered_out > 0 {
        println!();
        println!("Note: {} additional screens filtered out", report.filtered_out);
    }

    if !report.screens.is_empty() {
        println!();
        println!("Dependency Paths:");
        for screen in report.screens.iter().take(IMPACT_PATHS_SHOWN) {
            println!("  {}:", screen.label);
            for (depth, id) in screen.path.iter().enumerate() {
                let label = graph.node(id).map_or(id.as_str(), |n| n.label.as_str());
                let arrow = if depth > 0 { "-> " } else { "" };
                println!("    {}{}{}", "  ".repeat(depth), arrow, label);
            }
        }
        if report.screens.len() > IMPACT_PATHS_SHOWN {
            println!(
                "... and {} more screens",
                report.screens.len() - IMPACT_PATHS_SHOWN
            );
        }
    }
    Ok(())
}

fn run_diff(old_path: &Path, new_path: &Path, filter: Option<&str>) -> Result<()> {
    let old = load_graph(old_path)?;
    let new = load_graph(new_path)?;
    let matcher = screen_filter(filter)?;

    println!("Dependency Diff");
    println!("===============");
    println!("Old: {}", old_path.display());
    println!("New: {}", new_path.display());
    if let Some(pattern) = filter {
        println!("Filter: {}", pattern);
    }
    println!();

    let diff = GraphDiff::compute(&old, &new, matcher.as_ref());

    println!("Added Nodes ({}):", diff.added_nodes.len());
    for node in &diff.added_nodes {
        println!("  + {} - {}", node.id, node.label);
    }
    println!();
    println!("Removed Nodes ({}):", diff.removed_nodes.len());
    for node in &diff.removed_nodes {
        println!("  - {} - {}", node.id, node.label);
    }
    println!();
    println!("Added Edges ({}):", diff.added_edges.len());
    for edge in &diff.added_edges {
        println!("  + {} -> {}", edge.from, edge.to);
    }
    println!();
    println!("Removed Edges ({}):", diff.removed_edges.len());
    for edge in &diff.removed_edges {
        println!("  - {} -> {}", edge.from, edge.to);
    }

    println!();
    println!("Summary:");
    println!("{}", diff.summary);
    Ok(())
}
