//! Run an optimization and print the result.

use anyhow::{Context, Result};
use antrail::prelude::*;
use colored::Colorize;

use super::common;
use crate::config::Config;

pub fn run(start: &str, end: &str, blocked: &[String], output: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let client = common::service_client(&config)?;
    let overrides = common::parse_blocked(blocked)?;

    println!("{} Optimizing {} → {}", "→".blue(), start.cyan(), end.cyan());
    if !overrides.is_empty() {
        println!("  {} avoiding {} edge(s)", "•".yellow(), overrides.len());
    }

    let request = OptimizeRequest::new(start.into(), end.into(), &overrides);
    let (response, raw) = common::runtime()?.block_on(client.optimize_raw(&request))?;
    print_trace(&response.trace);

    if let Some(path) = output {
        std::fs::write(path, raw).with_context(|| format!("Failed to write {}", path))?;
        println!("  {} Saved response to {}", "✓".green(), path);
    }
    Ok(())
}

pub fn print_trace(trace: &OptimizationTrace) {
    println!();
    if trace.has_path() {
        println!("  Best path: {}", common::format_path(&trace.best_path).bold());
        println!("  Distance:  {}", trace.distance);
    } else {
        println!("  {} no path", "•".yellow());
    }
    println!("  Iterations: {}", trace.len());

    let improved = trace
        .iterations
        .windows(2)
        .filter(|w| w[1].best_distance < w[0].best_distance)
        .count();
    if improved > 0 {
        println!("  Improved {} time(s) after the first iteration", improved);
    }
}
