//! EdgePathResolver: maps an edge to the polyline an agent follows.
//!
//! Straight mode answers every lookup with the two-point segment between the
//! endpoints. Routed mode answers with the same segment until a routing
//! collaborator has delivered a road-following polyline, then switches to
//! it on the next lookup.
//!
//! The cache is keyed by the unordered edge and stores both directions, so
//! `resolve(b, a)` is always the point-reversed `resolve(a, b)`. It lives as
//! long as the current graph and is dropped wholesale by
//! [`EdgePathResolver::replace_graph`].
//!
//! The resolver never performs I/O. Routed lookups are queued as
//! [`RouteRequest`]s for the host to dispatch; answers come back through
//! [`EdgePathResolver::complete`].

use crate::config::PathMode;
use antrail_core::error::ResolutionFailure;
use antrail_core::graph::GraphModel;
use antrail_core::types::{EdgeKey, NodeId, Point};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// An ordered, non-empty run of points from one endpoint to the other.
pub type Polyline = Arc<[Point]>;

#[derive(Debug, Clone)]
struct CachedRoute {
    /// Canonical direction, low endpoint first.
    forward: Polyline,
    reverse: Polyline,
}

impl CachedRoute {
    fn new(forward: Vec<Point>) -> Self {
        let reverse: Vec<Point> = forward.iter().rev().copied().collect();
        Self {
            forward: forward.into(),
            reverse: reverse.into(),
        }
    }

    fn oriented(&self, from: &NodeId, to: &NodeId) -> Polyline {
        if EdgeKey::is_canonical_direction(from, to) {
            Arc::clone(&self.forward)
        } else {
            Arc::clone(&self.reverse)
        }
    }
}

/// A routed lookup waiting to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub key: EdgeKey,
    /// Canonical low endpoint and its position.
    pub from: NodeId,
    pub from_point: Point,
    pub to: NodeId,
    pub to_point: Point,
    /// Graph generation the request belongs to.
    pub generation: u64,
}

/// Resolves edges to renderable polylines, with a per-graph cache.
#[derive(Debug)]
pub struct EdgePathResolver {
    graph: Arc<GraphModel>,
    mode: PathMode,
    cache: HashMap<EdgeKey, CachedRoute>,
    /// Requested and not yet answered.
    in_flight: HashSet<EdgeKey>,
    /// Requested and not yet handed out by `take_requests`.
    queue: Vec<EdgeKey>,
    generation: u64,
}

impl EdgePathResolver {
    pub fn new(graph: Arc<GraphModel>, mode: PathMode) -> Self {
        Self {
            graph,
            mode,
            cache: HashMap::new(),
            in_flight: HashSet::new(),
            queue: Vec::new(),
            generation: 0,
        }
    }

    pub fn graph(&self) -> &Arc<GraphModel> {
        &self.graph
    }

    pub fn mode(&self) -> PathMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The polyline from `from` to `to`, or `None` if either node is unknown.
    ///
    /// First point is at `from`, last at `to`.
    pub fn resolve(&mut self, from: &NodeId, to: &NodeId) -> Option<Polyline> {
        let key = EdgeKey::between(from, to);
        if let Some(route) = self.cache.get(&key) {
            return Some(route.oriented(from, to));
        }

        let from_point = self.graph.position(from)?;
        let to_point = self.graph.position(to)?;

        match self.mode {
            PathMode::Straight => {
                let route = self.store(key, from, vec![from_point, to_point]);
                Some(route.oriented(from, to))
            }
            PathMode::Routed => {
                if self.in_flight.insert(key.clone()) {
                    self.queue.push(key);
                }
                Some(Arc::from(vec![from_point, to_point]))
            }
        }
    }

    /// Hand out every queued lookup. Each edge is handed out once.
    pub fn take_requests(&mut self) -> Vec<RouteRequest> {
        let generation = self.generation;
        let graph = Arc::clone(&self.graph);
        self.queue
            .drain(..)
            .filter_map(|key| {
                let (from, to) = key.endpoints();
                Some(RouteRequest {
                    from_point: graph.position(from)?,
                    to_point: graph.position(to)?,
                    from: from.clone(),
                    to: to.clone(),
                    key: key.clone(),
                    generation,
                })
            })
            .collect()
    }

    /// Record the answer to a routed lookup. Returns whether the cache changed.
    ///
    /// Answers for a previous graph and answers for edges already cached are
    /// ignored. A failure caches the straight segment so the edge is not
    /// looked up again.
    pub fn complete(
        &mut self,
        request: &RouteRequest,
        result: Result<Vec<Point>, ResolutionFailure>,
    ) -> bool {
        if request.generation != self.generation {
            debug!(edge = %request.key, "dropping route for a replaced graph");
            return false;
        }
        self.in_flight.remove(&request.key);
        if self.cache.contains_key(&request.key) {
            return false;
        }

        let points = match result {
            Ok(mut points) if points.len() >= 2 => {
                // Routers snap to the nearest road; pin the ends to the nodes.
                points[0] = request.from_point;
                let last = points.len() - 1;
                points[last] = request.to_point;
                debug!(edge = %request.key, points = points.len(), "route resolved");
                points
            }
            Ok(points) => {
                warn!(
                    edge = %request.key,
                    points = points.len(),
                    "route has too few points; using straight segment"
                );
                vec![request.from_point, request.to_point]
            }
            Err(failure) => {
                warn!(edge = %request.key, %failure, "route lookup failed; using straight segment");
                vec![request.from_point, request.to_point]
            }
        };
        self.store(request.key.clone(), &request.from, points);
        true
    }

    /// Swap in a new graph and drop everything cached for the old one.
    pub fn replace_graph(&mut self, graph: Arc<GraphModel>) {
        self.graph = graph;
        self.invalidate();
    }

    /// Change mode; cached paths from the old mode are dropped.
    pub fn set_mode(&mut self, mode: PathMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    pub fn is_cached(&self, a: &NodeId, b: &NodeId) -> bool {
        self.cache.contains_key(&EdgeKey::between(a, b))
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Lookups requested and not yet answered.
    pub fn pending_len(&self) -> usize {
        self.in_flight.len()
    }

    fn invalidate(&mut self) {
        self.cache.clear();
        self.in_flight.clear();
        self.queue.clear();
        self.generation += 1;
    }

    /// Cache `points`, which run from `start` to the other end of `key`.
    fn store(&mut self, key: EdgeKey, start: &NodeId, mut points: Vec<Point>) -> &CachedRoute {
        if key.endpoints().0 != start {
            points.reverse();
        }
        self.cache.entry(key).or_insert_with(|| CachedRoute::new(points))
    }
}
