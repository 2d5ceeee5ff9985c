//! Print the graph served by the optimizer.

use anyhow::Result;
use antrail::prelude::*;
use colored::Colorize;

use super::common;
use crate::config::Config;

pub fn run(json: bool) -> Result<()> {
    let config = Config::load()?;
    let client = common::service_client(&config)?;

    if json {
        let graph = common::runtime()?.block_on(client.get_graph())?;
        println!("{}", graph_json(&graph)?);
        return Ok(());
    }

    println!("{} Fetching graph from {}", "→".blue(), client.endpoint());
    let graph = common::runtime()?.block_on(client.get_graph())?;
    print_graph(&graph);
    Ok(())
}

/// The graph in the service's own wire shape, pretty-printed.
pub fn graph_json(graph: &GraphModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GraphPayload::from_model(graph))?)
}

pub fn print_graph(graph: &GraphModel) {
    println!();
    println!("{}", "Nodes".bold());
    for node in graph.nodes() {
        let position = match node.coordinates {
            Coordinates::Geographic { lat, lng } => format!("{:.4}, {:.4}", lat, lng),
            Coordinates::Planar { x, y } => format!("({}, {})", x, y),
        };
        match &node.name {
            Some(name) => println!("  {} {} {}", node.id.as_str().cyan(), position, name.dimmed()),
            None => println!("  {} {}", node.id.as_str().cyan(), position),
        }
    }

    println!();
    println!("{}", "Edges".bold());
    for edge in graph.edges() {
        let marker = if edge.is_blocked {
            "blocked".red().to_string()
        } else {
            String::new()
        };
        println!("  {} – {}  {:.2} {}", edge.from, edge.to, edge.weight, marker);
    }

    println!();
    println!(
        "{} {} nodes, {} edges",
        "✓".green(),
        graph.node_count(),
        graph.edge_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_matches_the_service_shape() {
        let graph = parse_graph(
            r#"{"nodes": {"A": {"x": 0.0, "y": 0.0}, "B": {"x": 1.0, "y": 0.0, "name": "b"}},
                "edges": [{"from": "A", "to": "B", "weight": 1.0, "is_blocked": true}]}"#,
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&graph_json(&graph).unwrap()).unwrap();
        assert_eq!(value["nodes"]["B"]["name"], "b");
        assert!(value["nodes"]["A"].get("lat").is_none());
        assert_eq!(value["edges"][0]["is_blocked"], true);
    }
}
