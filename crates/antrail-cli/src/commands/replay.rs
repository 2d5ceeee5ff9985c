//! Replay a trace headlessly through the playback driver.

use anyhow::{Context, Result};
use antrail::prelude::*;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use super::common;
use crate::config::Config;

/// Where the trace comes from.
pub enum Source {
    /// A saved optimize response.
    File(String),
    /// A fresh optimization.
    Optimize {
        start: String,
        end: String,
        blocked: Vec<String>,
    },
}

pub fn run(source: Source, best_only: bool, routed: bool, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let mut playback = config.playback.clone();
    if best_only {
        playback.spawn_filter = SpawnFilter::BestOnly;
    }
    if routed {
        playback.path_mode = PathMode::Routed;
    }

    let rt = common::runtime()?;
    rt.block_on(replay(&config, source, playback, verbose))
}

async fn replay(
    config: &Config,
    source: Source,
    mut playback: PlaybackConfig,
    verbose: bool,
) -> Result<()> {
    let client = common::service_client(config)?;
    let response = match source {
        Source::File(path) => {
            println!("{} Loading trace from {}", "→".blue(), path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path))?;
            parse_optimize_response(&text)
                .with_context(|| format!("Failed to ingest {}", path))?
        }
        Source::Optimize { start, end, blocked } => {
            let overrides = common::parse_blocked(&blocked)?;
            println!("{} Optimizing {} → {}", "→".blue(), start.cyan(), end.cyan());
            client
                .optimize(&start.into(), &end.into(), &overrides)
                .await?
        }
    };
    let graph = graph_for(&client, &response).await?;

    if playback.path_mode == PathMode::Routed
        && graph.coordinate_system() != Some(CoordinateSystem::Geographic)
    {
        println!(
            "  {} graph is not geographic, drawing straight edges",
            "•".yellow()
        );
        playback.path_mode = PathMode::Straight;
    }
    let routed = playback.path_mode == PathMode::Routed;

    let mut controller = PlaybackController::with_graph(graph, playback)?;
    controller.load_trace(response.trace.clone())?;
    let trace = response.trace;

    if trace.is_empty() {
        println!("  {} trace has no iterations to replay", "•".yellow());
        return Ok(());
    }

    let mut driver = PlaybackDriver::new(controller);
    if routed {
        let router = OsrmRouter::new(config.routing.clone())?;
        driver = driver.with_provider(Arc::new(router));
    }

    let pb = ProgressBar::new(trace.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    driver.start()?;
    let result = driver
        .run_to_end(|frame, outcome| {
            let completed = match outcome {
                TickOutcome::Advanced { iteration } => Some(iteration.saturating_sub(1)),
                TickOutcome::Finished => Some(trace.len() - 1),
                TickOutcome::Running { agents } => {
                    if verbose {
                        pb.set_message(format!("{} agents", agents));
                    }
                    None
                }
                _ => None,
            };
            if let Some(index) = completed {
                if let Some(snapshot) = trace.iteration(index) {
                    pb.println(summary(snapshot));
                }
                pb.inc(1);
            }
            if let Some(remaining) = frame.settle_remaining_ms {
                pb.set_message(format!("settling {}ms", remaining));
            }
        })
        .await;

    match result {
        Ok(()) => {
            pb.finish_with_message("done");
            println!();
            println!(
                "{} Replayed {} iterations, overall best {}",
                "✓".green().bold(),
                trace.len(),
                trace.distance
            );
            if trace.has_path() {
                println!("  {}", common::format_path(&trace.best_path));
            }
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("stopped");
            Err(e).context("Playback stopped")
        }
    }
}

/// The graph a trace was optimized over: the echoed one when present,
/// otherwise whatever the service serves now.
async fn graph_for(client: &GraphServiceClient, response: &OptimizeResponse) -> Result<GraphModel> {
    match &response.graph {
        Some(graph) => Ok(graph.clone()),
        None => Ok(client.get_graph().await?),
    }
}

fn summary(snapshot: &IterationSnapshot) -> String {
    let path = if snapshot.best_path.is_empty() {
        "no path".to_string()
    } else {
        common::format_path(&snapshot.best_path)
    };
    format!(
        "  Iteration {:>3}: best {:>8}  {} candidate(s)  {}",
        snapshot.iteration,
        snapshot.best_distance.to_string(),
        snapshot.paths.len(),
        path
    )
}
