//! PlaybackController: sequences iterations and owns the render state.
//!
//! ```text
//! Idle --load_trace--> Ready --start--> Animating(0) --tick...--> Animating(1) ... --> Ready
//!                        ^                   |
//!                        +------ stop -------+
//! ```
//!
//! When the last agent of an iteration arrives the controller does not cut
//! straight to the next one: it waits out the settle delay first, counted
//! from the `dt` of the following ticks. `stop`, `load_trace` and
//! `replace_graph` cancel that wait along with any outstanding frame tokens.

use crate::config::{ConfigError, PathMode, PlaybackConfig, SpawnFilter};
use crate::resolver::{EdgePathResolver, RouteRequest};
use crate::scheduler::{FrameScheduler, FrameToken, Settle};
use crate::simulator::{Agent, AntSimulator};
use antrail_core::blocked::BlockedEdges;
use antrail_core::error::{AntrailError, ResolutionFailure, Result, ValidationError};
use antrail_core::graph::GraphModel;
use antrail_core::ingest::OptimizeResponse;
use antrail_core::overlay::{edge_overlays, EdgeOverlay};
use antrail_core::trace::{IterationSnapshot, OptimizationTrace};
use antrail_core::types::{Distance, NodeId, Point};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    /// No trace loaded.
    Idle,
    /// Trace loaded, not animating.
    Ready,
    /// Animating the iteration at this index.
    Animating { iteration: usize },
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Animating { iteration } => {
                write!(f, "animating iteration index {}", iteration)
            }
        }
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Agents are still walking.
    Running { agents: usize },
    /// All agents arrived; waiting before the next iteration.
    Settling { remaining: Duration },
    /// Moved on to the iteration at this index.
    Advanced { iteration: usize },
    /// The last iteration is done; the controller is `Ready` again.
    Finished,
    /// The tick belonged to a cancelled run and was ignored.
    Stale,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub state: PlaybackState,
    pub animating: bool,
    /// Index of the iteration on screen.
    pub iteration_index: usize,
    /// The producer's 1-based number for that iteration.
    pub iteration: Option<u32>,
    pub total_iterations: usize,
    pub best_distance: Option<Distance>,
    pub best_path: Vec<NodeId>,
    /// Distance of the trace's overall best path.
    pub overall_distance: Option<Distance>,
    pub agents: Vec<Agent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_remaining_ms: Option<u64>,
}

impl Frame {
    pub fn agent_positions(&self) -> impl Iterator<Item = (usize, Point)> + '_ {
        self.agents.iter().map(|a| (a.id, a.position))
    }
}

/// Drives playback of one trace over one graph.
#[derive(Debug)]
pub struct PlaybackController {
    config: PlaybackConfig,
    graph: Arc<GraphModel>,
    trace: Option<Arc<OptimizationTrace>>,
    resolver: EdgePathResolver,
    simulator: AntSimulator,
    scheduler: FrameScheduler,
    state: PlaybackState,
    agents: Vec<Agent>,
    iteration_index: usize,
}

impl PlaybackController {
    /// Create a controller over an empty graph.
    pub fn new(config: PlaybackConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_graph(GraphModel::empty(), config)
    }

    pub fn with_graph(
        graph: GraphModel,
        config: PlaybackConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let graph = Arc::new(graph);
        Ok(Self {
            resolver: EdgePathResolver::new(Arc::clone(&graph), config.path_mode),
            simulator: AntSimulator::new(&config),
            scheduler: FrameScheduler::new(config.settle_delay()),
            graph,
            trace: None,
            state: PlaybackState::Idle,
            agents: Vec::new(),
            iteration_index: 0,
            config,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, PlaybackState::Animating { .. })
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<GraphModel> {
        &self.graph
    }

    pub fn trace(&self) -> Option<&OptimizationTrace> {
        self.trace.as_deref()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn iteration_index(&self) -> usize {
        self.iteration_index
    }

    pub fn resolver(&self) -> &EdgePathResolver {
        &self.resolver
    }

    /// Token for the current run, if animating.
    pub fn frame_token(&self) -> Option<FrameToken> {
        self.scheduler.token()
    }

    /// Takes effect from the next spawned iteration.
    pub fn set_spawn_filter(&mut self, filter: SpawnFilter) {
        self.config.spawn_filter = filter;
    }

    /// Switching mode drops every cached path.
    pub fn set_path_mode(&mut self, mode: PathMode) {
        self.config.path_mode = mode;
        self.resolver.set_mode(mode);
    }

    /// Load a trace, cancelling any playback in progress.
    ///
    /// Every node the trace mentions must exist in the current graph.
    pub fn load_trace(&mut self, trace: OptimizationTrace) -> Result<()> {
        if let Some(unknown) = trace.referenced_nodes().find(|n| !self.graph.contains(n)) {
            return Err(ValidationError::UnknownNode(unknown.clone()).into());
        }
        if let Some(violation) = trace.first_sequence_violation() {
            warn!(%violation, "loaded trace is out of sequence; playback will stop there");
        }

        self.halt();
        info!(
            iterations = trace.len(),
            distance = %trace.distance,
            "trace loaded"
        );
        self.trace = Some(Arc::new(trace));
        self.iteration_index = 0;
        self.state = PlaybackState::Ready;
        Ok(())
    }

    /// Load an optimize response, adopting the graph it echoes back, if any.
    pub fn load_response(&mut self, response: OptimizeResponse) -> Result<()> {
        if let Some(graph) = response.graph {
            self.replace_graph(graph);
        }
        self.load_trace(response.trace)
    }

    /// Swap in a reloaded graph. Stops playback and drops cached paths; the
    /// trace is kept.
    pub fn replace_graph(&mut self, graph: GraphModel) {
        if self.is_animating() {
            info!("playback stopped by graph reload");
        }
        self.halt();
        let graph = Arc::new(graph);
        self.resolver.replace_graph(Arc::clone(&graph));
        self.graph = graph;
        self.state = if self.trace.is_some() {
            PlaybackState::Ready
        } else {
            PlaybackState::Idle
        };
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "graph replaced"
        );
    }

    /// Begin animating iteration 0.
    pub fn start(&mut self) -> Result<FrameToken> {
        if self.state != PlaybackState::Ready {
            return Err(AntrailError::invalid_transition("start", self.state));
        }
        let Some(trace) = self.trace.clone() else {
            return Err(AntrailError::invalid_transition("start", "without a trace"));
        };
        let Some(first) = trace.iteration(0) else {
            return Err(AntrailError::invalid_transition(
                "start",
                "ready with an empty trace",
            ));
        };
        trace.check_iteration(0)?;

        let token = self.scheduler.schedule();
        self.begin_iteration(0, first);
        info!(iterations = trace.len(), "playback started");
        Ok(token)
    }

    /// Stop animating and discard all agents.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_animating() {
            return Err(AntrailError::invalid_transition("stop", self.state));
        }
        self.halt();
        info!(iteration = self.iteration_index, "playback stopped");
        Ok(())
    }

    /// Advance the animation by `dt`. Fails unless animating.
    pub fn tick(&mut self, dt: Duration) -> Result<TickOutcome> {
        let PlaybackState::Animating { iteration } = self.state else {
            return Err(AntrailError::invalid_transition("tick", self.state));
        };

        match self.scheduler.consume_settle(dt) {
            Settle::Pending(remaining) => return Ok(TickOutcome::Settling { remaining }),
            Settle::Elapsed => return self.advance_iteration(iteration),
            Settle::Inactive => {}
        }

        self.agents = self.simulator.advance(&self.agents, dt, &mut self.resolver);
        if self.agents.is_empty() {
            let remaining = self.scheduler.begin_settle();
            debug!(iteration, "all agents arrived; settling");
            return Ok(TickOutcome::Settling { remaining });
        }
        Ok(TickOutcome::Running {
            agents: self.agents.len(),
        })
    }

    /// Tick on behalf of a host loop. A tick carrying a cancelled token, or
    /// arriving after playback stopped, is ignored.
    pub fn tick_scheduled(&mut self, token: FrameToken, dt: Duration) -> Result<TickOutcome> {
        if !self.scheduler.is_current(token) || !self.is_animating() {
            debug!(generation = token.generation(), "ignoring stale tick");
            return Ok(TickOutcome::Stale);
        }
        self.tick(dt)
    }

    /// Routed lookups waiting to be dispatched.
    pub fn take_route_requests(&mut self) -> Vec<RouteRequest> {
        self.resolver.take_requests()
    }

    pub fn complete_route(
        &mut self,
        request: &RouteRequest,
        result: std::result::Result<Vec<Point>, ResolutionFailure>,
    ) -> bool {
        self.resolver.complete(request, result)
    }

    /// Edge classification for the iteration on screen.
    pub fn overlays(&self, overrides: &BlockedEdges) -> Vec<EdgeOverlay> {
        edge_overlays(&self.graph, overrides, self.trace(), self.iteration_index)
    }

    pub fn frame(&self) -> Frame {
        let trace = self.trace();
        let snapshot = trace.and_then(|t| t.iteration(self.iteration_index));
        Frame {
            state: self.state,
            animating: self.is_animating(),
            iteration_index: self.iteration_index,
            iteration: snapshot.map(|s| s.iteration),
            total_iterations: trace.map_or(0, OptimizationTrace::len),
            best_distance: snapshot.map(|s| s.best_distance),
            best_path: snapshot.map(|s| s.best_path.clone()).unwrap_or_default(),
            overall_distance: trace.map(|t| t.distance),
            agents: self.agents.clone(),
            settle_remaining_ms: self
                .scheduler
                .settle_remaining()
                .map(|d| d.as_millis() as u64),
        }
    }

    fn advance_iteration(&mut self, current: usize) -> Result<TickOutcome> {
        let Some(trace) = self.trace.clone() else {
            self.halt();
            return Ok(TickOutcome::Finished);
        };

        let next = current + 1;
        let Some(snapshot) = trace.iteration(next) else {
            self.halt();
            info!(iterations = trace.len(), "playback finished");
            return Ok(TickOutcome::Finished);
        };
        if let Err(violation) = trace.check_iteration(next) {
            self.halt();
            warn!(%violation, "stopping playback at out-of-sequence iteration");
            return Err(violation.into());
        }

        self.begin_iteration(next, snapshot);
        info!(iteration = snapshot.iteration, "advanced to next iteration");
        Ok(TickOutcome::Advanced { iteration: next })
    }

    fn begin_iteration(&mut self, index: usize, snapshot: &IterationSnapshot) {
        self.agents = self
            .simulator
            .spawn(snapshot, &mut self.resolver, self.config.spawn_filter);
        self.iteration_index = index;
        self.state = PlaybackState::Animating { iteration: index };
    }

    /// Back to `Ready` (or `Idle`) with no agents and no outstanding ticks.
    fn halt(&mut self) {
        self.scheduler.cancel();
        self.agents.clear();
        self.state = if self.trace.is_some() {
            PlaybackState::Ready
        } else {
            PlaybackState::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antrail_core::ingest::parse_trace;
    use antrail_core::types::{Edge, Node};

    fn controller() -> PlaybackController {
        let graph = GraphModel::new(
            vec![Node::planar("A", 0.0, 0.0), Node::planar("B", 1.0, 0.0)],
            vec![Edge::new("A", "B", 1.0)],
        )
        .unwrap();
        PlaybackController::with_graph(
            graph,
            PlaybackConfig {
                seed: Some(1),
                ..PlaybackConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn starts_idle_and_refuses_to_start() {
        let mut c = controller();
        assert_eq!(c.state(), PlaybackState::Idle);
        let err = c.start().unwrap_err();
        assert_eq!(err.to_string(), "invalid transition: cannot start while idle");
        assert!(c.tick(Duration::from_millis(50)).is_err());
        assert!(c.stop().is_err());
    }

    #[test]
    fn rejects_traces_over_unknown_nodes() {
        let mut c = controller();
        let trace = parse_trace(
            r#"{"best_path": ["A", "Q"], "distance": 1.0, "iterations": [
                {"iteration": 1, "best_distance": 1.0, "best_path": ["A", "Q"],
                 "paths": [[["A", "Q"], 1.0]], "pheromone_levels": {}}]}"#,
        )
        .unwrap();
        let err = c.load_trace(trace).unwrap_err();
        assert_eq!(
            err,
            AntrailError::Validation(ValidationError::UnknownNode(NodeId::from("Q")))
        );
        assert_eq!(c.state(), PlaybackState::Idle);
    }

    #[test]
    fn empty_trace_cannot_start() {
        let mut c = controller();
        c.load_trace(parse_trace(r#"{"best_path": [], "distance": null, "iterations": []}"#).unwrap())
            .unwrap();
        assert_eq!(c.state(), PlaybackState::Ready);
        assert!(matches!(
            c.start(),
            Err(AntrailError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn state_serializes_with_a_tag() {
        let json = serde_json::to_string(&PlaybackState::Animating { iteration: 2 }).unwrap();
        assert_eq!(json, r#"{"state":"animating","iteration":2}"#);
    }
}
