//! OptimizationTrace: the recorded output of one optimize run.
//!
//! Immutable once ingested. Pheromone keys are already canonical here, so
//! lookups never have to guess which direction the producer used.

use crate::error::SequencingViolation;
use crate::types::*;
use std::collections::BTreeMap;

/// One candidate path an ant produced during an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePath {
    pub nodes: Vec<NodeId>,
    pub distance: Distance,
}

impl CandidatePath {
    pub fn new(nodes: Vec<NodeId>, distance: Distance) -> Self {
        Self { nodes, distance }
    }

    /// Number of logical edges the path walks.
    pub fn segment_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Start equals end: nothing to walk.
    pub fn is_zero_length(&self) -> bool {
        self.segment_count() == 0
    }
}

/// One generation of the search.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationSnapshot {
    /// 1-based iteration number as reported by the producer.
    pub iteration: u32,
    pub best_distance: Distance,
    /// Best path found so far; empty when none was found yet.
    pub best_path: Vec<NodeId>,
    /// Candidate paths. `paths[0]` is this iteration's canonical best.
    pub paths: Vec<CandidatePath>,
    pub pheromone_levels: BTreeMap<EdgeKey, f64>,
}

impl IterationSnapshot {
    /// The first candidate, which the producer orders as the best.
    pub fn best_candidate(&self) -> Option<&CandidatePath> {
        self.paths.first()
    }

    pub fn pheromone(&self, key: &EdgeKey) -> Option<f64> {
        self.pheromone_levels.get(key).copied()
    }
}

/// Full result of one optimize request.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationTrace {
    /// Overall best path; empty when no path exists.
    pub best_path: Vec<NodeId>,
    pub distance: Distance,
    pub iterations: Vec<IterationSnapshot>,
    pub total_iterations: Option<u32>,
    pub ants_per_iteration: Option<u32>,
}

impl OptimizationTrace {
    pub fn iteration(&self, index: usize) -> Option<&IterationSnapshot> {
        self.iterations.get(index)
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn has_path(&self) -> bool {
        !self.best_path.is_empty() && self.distance.is_reachable()
    }

    /// Check the numbering of the iteration at `index` (expects `index + 1`).
    pub fn check_iteration(&self, index: usize) -> Result<(), SequencingViolation> {
        let Some(snapshot) = self.iterations.get(index) else {
            return Ok(());
        };
        let expected = index as u32 + 1;
        if snapshot.iteration != expected {
            return Err(SequencingViolation::OutOfOrder {
                index,
                expected,
                found: snapshot.iteration,
            });
        }
        Ok(())
    }

    /// The first numbering problem, if any.
    pub fn first_sequence_violation(&self) -> Option<SequencingViolation> {
        if self.iterations.is_empty() && !self.best_path.is_empty() {
            return Some(SequencingViolation::MissingIterations);
        }
        (0..self.iterations.len()).find_map(|i| self.check_iteration(i).err())
    }

    /// Whether `a`-`b` is one of the hops of the overall best path.
    pub fn best_path_uses(&self, a: &NodeId, b: &NodeId) -> bool {
        self.best_path
            .windows(2)
            .any(|w| (&w[0] == a && &w[1] == b) || (&w[0] == b && &w[1] == a))
    }

    /// Every node id the trace mentions.
    pub fn referenced_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.best_path.iter().chain(self.iterations.iter().flat_map(|it| {
            it.best_path
                .iter()
                .chain(it.paths.iter().flat_map(|p| p.nodes.iter()))
        }))
    }
}
