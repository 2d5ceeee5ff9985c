//! Antrail CLI - fetch graphs, run optimizations and replay their traces.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "antrail")]
#[command(author, version, about = "Antrail - replay ant colony optimization traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default antrail.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Fetch and print the graph
    Graph {
        /// Print the graph as JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Run an optimization and print the best path
    Optimize {
        /// Start node
        #[arg(short, long)]
        start: String,

        /// End node
        #[arg(short, long)]
        end: String,

        /// Edge to avoid, as A-B (repeatable)
        #[arg(short, long = "block")]
        blocked: Vec<String>,

        /// Save the raw response for a later replay
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replay a trace headlessly, one summary line per iteration
    Replay {
        /// Saved optimize response to replay
        #[arg(short, long, conflicts_with_all = ["start", "end"])]
        trace: Option<String>,

        /// Start node (runs a fresh optimization)
        #[arg(short, long, requires = "end")]
        start: Option<String>,

        /// End node
        #[arg(short, long, requires = "start")]
        end: Option<String>,

        /// Edge to avoid, as A-B (repeatable)
        #[arg(short, long = "block")]
        blocked: Vec<String>,

        /// Animate only each iteration's best path
        #[arg(long)]
        best_only: bool,

        /// Follow roads from the configured router
        #[arg(long)]
        routed: bool,
    },

    /// Add or remove graph nodes
    Nodes {
        #[command(subcommand)]
        command: NodeCommands,
    },
}

#[derive(Subcommand)]
enum NodeCommands {
    /// Add a node
    Add {
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a node
    Remove {
        /// Node id
        id: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Graph { json } => commands::graph::run(json),
        Commands::Optimize { start, end, blocked, output } => {
            commands::optimize::run(&start, &end, &blocked, output.as_deref())
        }
        Commands::Replay { trace, start, end, blocked, best_only, routed } => {
            let source = match (trace, start, end) {
                (Some(path), _, _) => commands::replay::Source::File(path),
                (None, Some(start), Some(end)) => commands::replay::Source::Optimize {
                    start,
                    end,
                    blocked,
                },
                _ => anyhow::bail!("Pass either --trace FILE or --start and --end"),
            };
            commands::replay::run(source, best_only, routed, cli.verbose)
        }
        Commands::Nodes { command } => match command {
            NodeCommands::Add { id, lat, lng, name } => commands::nodes::add(&id, lat, lng, name),
            NodeCommands::Remove { id } => commands::nodes::remove(&id),
        },
    }
}
