//! Antrail Web - stream playback of optimization runs to the browser.

use anyhow::Result;
use antrail::prelude::{
    GraphServiceClient, PathMode, PlaybackConfig, RouterConfig, ServiceConfig, SpawnFilter,
};
use antrail_web::{routes, AppState, WorkerConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "antrail-web")]
#[command(about = "Antrail Web - live playback of ant colony optimization traces")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Graph service URL
    #[arg(long, default_value = "http://localhost:5000")]
    service_url: String,

    /// OSRM-compatible router URL for routed playback
    #[arg(long)]
    router_url: Option<String>,

    /// Animate only each iteration's best path
    #[arg(long)]
    best_only: bool,

    /// Seed for agent speeds
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    let client = GraphServiceClient::new(ServiceConfig {
        url: cli.service_url,
        ..ServiceConfig::default()
    })?;
    let routed = cli.router_url.is_some();
    let config = WorkerConfig {
        playback: PlaybackConfig {
            spawn_filter: if cli.best_only {
                SpawnFilter::BestOnly
            } else {
                SpawnFilter::AllPaths
            },
            path_mode: if routed { PathMode::Routed } else { PathMode::Straight },
            seed: cli.seed,
            ..PlaybackConfig::default()
        },
        router: cli.router_url.map(|url| RouterConfig {
            url,
            ..RouterConfig::default()
        }),
    };

    println!("Starting Antrail Web...");
    println!("Listening on http://{}", addr);

    let state = AppState::new(client, config)?;
    if let Err(e) = state.reload_graph().await {
        tracing::warn!(error = %e, "graph not loaded yet; POST /api/graph/reload to retry");
    }

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
