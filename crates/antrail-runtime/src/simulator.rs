//! AntSimulator: agents walking the candidate paths of one iteration.
//!
//! Each tick:
//! 1. Every live agent is placed on the polyline of its current edge
//! 2. Its progress grows by `speed * dt / reference_dt`
//! 3. An agent that reaches the end of an edge moves on to the next one
//! 4. Agents that have walked their whole path are dropped
//!
//! [`AntSimulator::advance`] returns a fresh collection; the input is left
//! untouched.

use crate::config::{PlaybackConfig, SpawnFilter};
use crate::resolver::EdgePathResolver;
use antrail_core::trace::IterationSnapshot;
use antrail_core::types::{Distance, NodeId, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// One animated ant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    /// Position of the walked path in the iteration's `paths`.
    pub id: usize,
    pub path: Vec<NodeId>,
    /// Index of the node the agent last left.
    pub segment_index: usize,
    /// Fraction of the current edge walked, in `[0, 1)`.
    pub progress: f64,
    pub position: Point,
    pub speed: f64,
    pub is_best: bool,
    /// Length of the candidate path being walked.
    pub distance: Distance,
    /// Positions of the most recent nodes reached, oldest first.
    pub trail: Vec<Point>,
}

impl Agent {
    pub fn is_finished(&self) -> bool {
        self.segment_index + 1 >= self.path.len()
    }

    /// The edge currently being walked.
    pub fn current_edge(&self) -> Option<(&NodeId, &NodeId)> {
        let from = self.path.get(self.segment_index)?;
        let to = self.path.get(self.segment_index + 1)?;
        Some((from, to))
    }
}

/// Spawns and advances agents.
#[derive(Debug)]
pub struct AntSimulator {
    rng: StdRng,
    min_speed: f64,
    max_speed: f64,
    reference_dt: Duration,
    trail_length: usize,
}

impl AntSimulator {
    pub fn new(config: &PlaybackConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            reference_dt: config.reference_dt(),
            trail_length: config.trail_length,
        }
    }

    /// Create one agent per selected candidate path of `snapshot`.
    ///
    /// Every edge the agents will walk is looked up once up front, so routed
    /// lookups are queued before the agents get there. Empty paths and paths
    /// through nodes the graph does not know are skipped.
    pub fn spawn(
        &mut self,
        snapshot: &IterationSnapshot,
        resolver: &mut EdgePathResolver,
        filter: SpawnFilter,
    ) -> Vec<Agent> {
        let selected = match filter {
            SpawnFilter::AllPaths => &snapshot.paths[..],
            SpawnFilter::BestOnly => &snapshot.paths[..snapshot.paths.len().min(1)],
        };

        let mut agents = Vec::with_capacity(selected.len());
        for (idx, candidate) in selected.iter().enumerate() {
            let Some(first) = candidate.nodes.first() else {
                continue;
            };
            let graph = resolver.graph();
            if let Some(unknown) = candidate.nodes.iter().find(|n| !graph.contains(n)) {
                warn!(
                    iteration = snapshot.iteration,
                    path = idx,
                    node = %unknown,
                    "skipping path through unknown node"
                );
                continue;
            }
            let Some(start) = graph.position(first) else {
                continue;
            };

            for hop in candidate.nodes.windows(2) {
                resolver.resolve(&hop[0], &hop[1]);
            }

            agents.push(Agent {
                id: idx,
                path: candidate.nodes.clone(),
                segment_index: 0,
                progress: 0.0,
                position: start,
                speed: self.draw_speed(),
                is_best: idx == 0,
                distance: candidate.distance,
                trail: vec![start],
            });
        }

        debug!(
            iteration = snapshot.iteration,
            agents = agents.len(),
            "agents spawned"
        );
        agents
    }

    /// Advance every agent by `dt`, dropping the ones that have finished.
    pub fn advance(
        &self,
        agents: &[Agent],
        dt: Duration,
        resolver: &mut EdgePathResolver,
    ) -> Vec<Agent> {
        let step = dt.as_secs_f64() / self.reference_dt.as_secs_f64();
        agents
            .iter()
            .filter(|agent| !agent.is_finished())
            .map(|agent| self.advance_one(agent, step, resolver))
            .filter(|agent| !agent.is_finished())
            .collect()
    }

    fn advance_one(&self, agent: &Agent, step: f64, resolver: &mut EdgePathResolver) -> Agent {
        let mut next = agent.clone();

        if let Some((from, to)) = agent.current_edge() {
            if let Some(polyline) = resolver.resolve(from, to) {
                next.position = interpolate(&polyline, agent.progress);
            }
        }

        next.progress += agent.speed * step;
        if next.progress >= 1.0 {
            next.progress = 0.0;
            next.segment_index += 1;
            if let Some(reached) = next
                .path
                .get(next.segment_index)
                .and_then(|id| resolver.graph().position(id))
            {
                next.trail.push(reached);
                if next.trail.len() > self.trail_length {
                    let excess = next.trail.len() - self.trail_length;
                    next.trail.drain(..excess);
                }
            }
        }
        next
    }

    fn draw_speed(&mut self) -> f64 {
        if self.max_speed > self.min_speed {
            self.rng.gen_range(self.min_speed..self.max_speed)
        } else {
            self.min_speed
        }
    }
}

/// Position at `progress` along a polyline, spreading progress evenly over
/// its sub-segments.
pub fn interpolate(points: &[Point], progress: f64) -> Point {
    match points.len() {
        0 => Point::default(),
        1 => points[0],
        n => {
            let scaled = progress.clamp(0.0, 1.0) * (n - 1) as f64;
            let local = (scaled.floor() as usize).min(n - 2);
            points[local].lerp(&points[local + 1], scaled - local as f64)
        }
    }
}
