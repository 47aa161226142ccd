mod config;
mod demo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use config::StudioConfig;
use studio_engine::{catalog, validate_workflow, WorkflowGraph};

/// Agent Studio - workflow editor sessions from the command line
#[derive(Parser)]
#[command(name = "studio")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every node type with its category and default label
    Catalog {
        /// Print the catalog as JSON grouped by category
        #[arg(long)]
        json: bool,
    },

    /// Build, run, test and save a sample workflow
    Demo {
        /// Seed for reproducible processing delays
        #[arg(long)]
        seed: Option<u64>,

        /// Unconnected nodes to add; they are skipped by the run
        #[arg(long, default_value_t = 0)]
        extra_nodes: usize,
    },

    /// Report structural issues in a saved workflow
    Validate {
        /// Path to a workflow saved as JSON
        workflow_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StudioConfig::load(path)
            .await
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => StudioConfig::default(),
    };

    match cli.command {
        Commands::Catalog { json } => print_catalog(json)?,
        Commands::Demo { seed, extra_nodes } => demo::run(&config, seed, extra_nodes).await?,
        Commands::Validate { workflow_file } => validate_file(workflow_file).await?,
    }

    Ok(())
}

fn print_catalog(json: bool) -> Result<()> {
    let grouped = catalog::by_category();
    if json {
        println!("{}", serde_json::to_string_pretty(&grouped)?);
        return Ok(());
    }
    for (category, entries) in grouped {
        println!("{:?}", category);
        for entry in entries {
            println!("  {:<22} {:<24} {}", entry.kind.as_str(), entry.label, entry.description);
        }
    }
    Ok(())
}

async fn validate_file(workflow_file: PathBuf) -> Result<()> {
    let contents = tokio::fs::read_to_string(&workflow_file)
        .await
        .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

    let graph: WorkflowGraph = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

    eprintln!(
        "Loaded workflow: {} ({} nodes, {} edges)",
        graph.name,
        graph.nodes.len(),
        graph.edges.len()
    );

    let issues = validate_workflow(&graph);
    if issues.is_empty() {
        println!("No issues found");
    }
    for issue in &issues {
        println!("{}", issue);
    }

    Ok(())
}
