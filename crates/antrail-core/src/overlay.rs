//! Per-edge classification for the renderer.
//!
//! Answers "is this edge blocked, and by whom", "is it on the best path"
//! and "how much pheromone is on it right now". Styling is left to the
//! renderer.

use crate::blocked::BlockedEdges;
use crate::graph::GraphModel;
use crate::pheromone;
use crate::trace::OptimizationTrace;
use crate::types::{Edge, NodeId};
use serde::Serialize;

/// Pheromone level at which an edge is drawn fully opaque.
pub const FULL_OPACITY_LEVEL: f64 = 10.0;

/// Where a block on an edge comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    None,
    /// Blocked by the graph service.
    Graph,
    /// Blocked by the user.
    Override,
    Both,
}

impl BlockSource {
    fn classify(graph_flag: bool, override_flag: bool) -> Self {
        match (graph_flag, override_flag) {
            (false, false) => BlockSource::None,
            (true, false) => BlockSource::Graph,
            (false, true) => BlockSource::Override,
            (true, true) => BlockSource::Both,
        }
    }

    pub fn is_blocked(&self) -> bool {
        !matches!(self, BlockSource::None)
    }
}

/// Render classification of one edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeOverlay {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    pub blocked: BlockSource,
    pub on_best_path: bool,
    pub pheromone: f64,
    /// `min(pheromone / 10, 1)`.
    pub opacity: f64,
}

/// Classify every edge of `graph` at `iteration_index`.
pub fn edge_overlays(
    graph: &GraphModel,
    overrides: &BlockedEdges,
    trace: Option<&OptimizationTrace>,
    iteration_index: usize,
) -> Vec<EdgeOverlay> {
    graph
        .edges()
        .iter()
        .map(|edge| overlay_for(edge, overrides, trace, iteration_index))
        .collect()
}

fn overlay_for(
    edge: &Edge,
    overrides: &BlockedEdges,
    trace: Option<&OptimizationTrace>,
    iteration_index: usize,
) -> EdgeOverlay {
    let level = pheromone::intensity(trace, iteration_index, &edge.from, &edge.to);
    EdgeOverlay {
        from: edge.from.clone(),
        to: edge.to.clone(),
        weight: edge.weight,
        blocked: BlockSource::classify(edge.is_blocked, overrides.contains(&edge.from, &edge.to)),
        on_best_path: trace.is_some_and(|t| t.best_path_uses(&edge.from, &edge.to)),
        pheromone: level,
        opacity: (level / FULL_OPACITY_LEVEL).clamp(0.0, 1.0),
    }
}

/// Whether `a`-`b` is blocked by either the graph or the overrides.
pub fn is_disallowed(graph: &GraphModel, overrides: &BlockedEdges, a: &NodeId, b: &NodeId) -> bool {
    overrides.contains(a, b) || graph.edge_between(a, b).is_some_and(|e| e.is_blocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_trace;
    use crate::types::Node;

    fn graph() -> GraphModel {
        GraphModel::new(
            vec![
                Node::planar("A", 0.0, 0.0),
                Node::planar("B", 1.0, 0.0),
                Node::planar("C", 2.0, 0.0),
            ],
            vec![Edge::new("A", "B", 1.0).blocked(), Edge::new("B", "C", 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn block_sources_are_kept_apart() {
        let graph = graph();
        let overrides = BlockedEdges::from_pairs([("B", "A"), ("C", "B")]);
        let overlays = edge_overlays(&graph, &overrides, None, 0);
        assert_eq!(overlays[0].blocked, BlockSource::Both);
        assert_eq!(overlays[1].blocked, BlockSource::Override);

        let overlays = edge_overlays(&graph, &BlockedEdges::new(), None, 0);
        assert_eq!(overlays[0].blocked, BlockSource::Graph);
        assert_eq!(overlays[1].blocked, BlockSource::None);
        assert!(is_disallowed(&graph, &BlockedEdges::new(), &"B".into(), &"A".into()));
    }

    #[test]
    fn pheromone_drives_opacity() {
        let trace = parse_trace(
            r#"{"best_path": ["C", "B"], "distance": 1.0, "iterations": [
                {"iteration": 1, "best_distance": 1.0, "best_path": ["C", "B"],
                 "paths": [[["C", "B"], 1.0]],
                 "pheromone_levels": {"('C', 'B')": 25.0, "('A', 'B')": 5.0}}]}"#,
        )
        .unwrap();
        let overlays = edge_overlays(&graph(), &BlockedEdges::new(), Some(&trace), 0);
        assert_eq!(overlays[0].opacity, 0.5);
        assert!(!overlays[0].on_best_path);
        assert_eq!(overlays[1].opacity, 1.0);
        assert!(overlays[1].on_best_path);

        let baseline = edge_overlays(&graph(), &BlockedEdges::new(), None, 0);
        assert_eq!(baseline[0].opacity, 0.1);
    }
}
