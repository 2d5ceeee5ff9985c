//! Add or remove graph nodes through the service.

use anyhow::{bail, Result};
use antrail::prelude::*;
use colored::Colorize;

use super::common;
use crate::config::Config;

pub fn add(id: &str, lat: f64, lng: f64, name: Option<String>) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        bail!("Coordinates {}, {} are out of range", lat, lng);
    }
    let config = Config::load()?;
    let client = common::service_client(&config)?;
    let node = NewNode {
        id: id.into(),
        lat,
        lng,
        name,
    };

    let graph = common::runtime()?.block_on(async {
        client.add_node(&node).await?;
        client.get_graph().await
    })?;
    println!("{} Added node {}", "✓".green(), id.cyan());
    println!("  {} graph now has {} nodes", "•".yellow(), graph.node_count());
    Ok(())
}

pub fn remove(id: &str) -> Result<()> {
    let config = Config::load()?;
    let client = common::service_client(&config)?;

    let graph = common::runtime()?.block_on(async {
        client.remove_node(&id.into()).await?;
        client.get_graph().await
    })?;
    println!("{} Removed node {}", "✓".green(), id.cyan());
    println!("  {} graph now has {} nodes", "•".yellow(), graph.node_count());
    Ok(())
}
